/// Builds a [`MappingArray`](crate::MappingArray) from `key => value` pairs,
/// preserving declaration order.
///
/// ```
/// use strata_core::{map, Value};
///
/// let raw = map! {
///     "fieldName" => "file",
///     "joinColumns" => Value::Null,
/// };
/// assert_eq!(raw.len(), 2);
/// ```
#[macro_export]
macro_rules! map {
    () => {
        $crate::MappingArray::new()
    };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::MappingArray::new();
        $(
            map.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        map
    }};
}
