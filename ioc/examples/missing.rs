use weave_ioc::{Arguments, Autowire, Container, ContainerError, Key, Parameter, Result};

struct UnregisteredService;

struct Mailer {
  _host: String,
}

impl Autowire for Mailer {
  fn parameters() -> Vec<Parameter> {
    // No type and no default: only an explicit argument can satisfy it.
    vec![Parameter::untyped("host")]
  }

  fn construct(args: Arguments) -> Result<Self> {
    Ok(Mailer {
      _host: args.cloned("host")?,
    })
  }
}

fn main() {
  let container = Container::new();

  println!("Attempting to resolve a service that was never registered...");
  match container.get::<UnregisteredService>(Key::of::<UnregisteredService>()) {
    Err(ContainerError::NotFound { id }) => println!("Correctly failed: `{}` is not bound.", id),
    other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
  }

  println!("\nNow building a type whose constructor cannot be satisfied...");
  match container.autowire::<Mailer>() {
    Err(err @ ContainerError::Dependency { .. }) => println!("Correctly failed: {}", err),
    other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
  }
}
