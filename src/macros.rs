//! # Internal Macros
//!
//! This module provides macros for reducing boilerplate when constructing
//! boundary objects.
//!
//! ## object!
//!
//! Builds an [`Object`](crate::types::Object) from `name => value` pairs.
//! Values go through `Value::from`, so any supported primitive works.
//!
//! ### Usage
//!
//! ```ignore
//! let row = object! {
//!     "name" => "Alice",
//!     "age"  => 30i64,
//!     "active" => true,
//! };
//! ```

/// Builds an `Object` from `name => value` pairs.
#[macro_export]
macro_rules! object {
    () => {
        $crate::types::Object::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut obj = $crate::types::Object::new();
        $(
            obj.insert(::std::string::String::from($name), $crate::types::Value::from($value));
        )+
        obj
    }};
}
