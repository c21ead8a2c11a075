use crate::container::Container;

/// Behavioural switches of a [`Container`].
///
/// With the `serde` feature enabled the options can be embedded in a host's
/// own configuration; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerOptions {
  /// Rebinding an id whose singleton was already constructed fails with
  /// `SingletonOverload` instead of discarding the instance.
  ///
  /// `Container::bind_singleton_with` overrides this per call.
  pub strict_singletons: bool,
  /// Rebinding an id already bound in the same scope fails with
  /// `DuplicateBinding`, unless done through `Container::replace`.
  pub forbid_rebinding: bool,
  /// Types declaring a scope can only be built inside a chain containing it.
  pub check_scope: bool,
}

impl Default for ContainerOptions {
  fn default() -> Self {
    Self {
      strict_singletons: false,
      forbid_rebinding: false,
      check_scope: true,
    }
  }
}

/// A builder for [`Container`] instances.
///
/// ```
/// use weave_ioc::Container;
///
/// let container = Container::builder()
///   .strict_singletons(true)
///   .forbid_rebinding(true)
///   .build();
/// assert!(container.options().strict_singletons);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContainerBuilder {
  options: ContainerOptions,
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn strict_singletons(mut self, strict: bool) -> Self {
    self.options.strict_singletons = strict;
    self
  }

  pub fn forbid_rebinding(mut self, forbid: bool) -> Self {
    self.options.forbid_rebinding = forbid;
    self
  }

  pub fn check_scope(mut self, check: bool) -> Self {
    self.options.check_scope = check;
    self
  }

  /// Replaces all options at once, e.g. with values deserialized from a file.
  pub fn options(mut self, options: ContainerOptions) -> Self {
    self.options = options;
    self
  }

  pub fn build(self) -> Container {
    Container::with_options(self.options)
  }
}
