use std::sync::Arc;

use weave_ioc::{Arguments, Autowire, BoxError, Container, Definition, Key, Parameter, Result, Scope};

struct Connection {
  dsn: Arc<String>,
}

impl Autowire for Connection {
  fn parameters() -> Vec<Parameter> {
    vec![Parameter::keyed("dsn", Key::named::<String>("dsn"))]
  }

  fn construct(args: Arguments) -> Result<Self> {
    Ok(Connection { dsn: args.get("dsn")? })
  }

  // Only ever built while a request is in flight.
  fn scope() -> Option<&'static str> {
    Some("request")
  }

  fn singleton() -> bool {
    true
  }

  fn finalizer() -> Option<fn(&Self) -> std::result::Result<(), BoxError>> {
    Some(|conn| {
      println!("Closing connection to {}", conn.dsn);
      Ok(())
    })
  }
}

fn main() -> Result<()> {
  let container = Container::new();
  container.bind(
    Key::named::<String>("dsn"),
    Definition::instance(String::from("postgres://primary")),
  )?;

  // Outside of a request the connection cannot be built.
  let outside = container.autowire::<Connection>();
  println!("Outside a request: {}", outside.err().map(|e| e.to_string()).unwrap_or_default());

  for replica in ["replica-a", "replica-b"] {
    let request = Scope::named("request").bind(
      Key::named::<String>("dsn"),
      Definition::instance(format!("postgres://{}", replica)),
    );

    container.run_scope(request, |c| -> Result<()> {
      let first = c.autowire::<Connection>()?;
      let second = c.autowire::<Connection>()?;
      println!("In {:?}: connected to {}", c.current_scope().chain(), first.dsn);
      assert!(Arc::ptr_eq(&first, &second));
      Ok(())
    })??;
  }

  assert!(container.current_scope().is_root());
  Ok(())
}
