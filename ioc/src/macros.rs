//! Public macros for building explicit argument maps.

/// Builds a [`Params`](crate::Params) map of explicit arguments.
///
/// Values are passed through verbatim and matched by parameter name.
///
/// # Examples
///
/// ```
/// use weave_ioc::params;
///
/// let params = params! { "retries" => 3u32, "label" => String::from("primary") };
/// assert_eq!(params.len(), 2);
/// assert!(params.get("retries").unwrap().is::<u32>());
///
/// let empty = params! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! params {
  () => {
    $crate::Params::new()
  };

  ($($name:expr => $value:expr),+ $(,)?) => {{
    let mut params = $crate::Params::new();
    $(params.insert($name, $value);)+
    params
  }};
}
