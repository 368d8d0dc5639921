/// Builds a `Vec<Child>` from a mixed list of elements and raw values.
///
/// Raw values (strings, numbers, booleans) become text elements once the
/// children are attached to an element.
///
/// # Usage
///
/// ```
/// use fiberui_core::{Props, children, element};
///
/// let count = 3;
/// let heading = element("h1", Props::new(), children!["Count: ", count]);
/// assert_eq!(heading.props().children().len(), 2);
/// ```
#[macro_export]
macro_rules! children {
    () => {
        ::std::vec::Vec::<$crate::Child>::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),+]
    };
}

/// Implements `From<$ty>` for both [`PropValue`](crate::PropValue) and
/// [`Child`](crate::Child) through the given `PropValue` variant.
macro_rules! impl_raw_value {
    ($variant:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for $crate::props::PropValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }

            impl From<$ty> for $crate::element::Child {
                fn from(value: $ty) -> Self {
                    Self::Raw($crate::props::PropValue::from(value))
                }
            }
        )+
    };
}
