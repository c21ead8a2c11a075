use std::sync::atomic::{AtomicUsize, Ordering};

use weave_ioc::{Container, Definition, Key};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn tracker(_: &Container) -> weave_ioc::Result<RequestTracker> {
  Ok(RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  })
}

fn main() -> weave_ioc::Result<()> {
  let container = Container::new();

  // --- Singleton Registration ---
  // This factory will only be called ONCE per owning scope.
  container.bind_singleton(
    Key::named::<RequestTracker>("singleton"),
    Definition::factory("singleton_tracker", tracker),
  )?;

  // --- Transient Registration ---
  // This factory will be called EVERY time the service is resolved.
  container.bind(
    Key::named::<RequestTracker>("transient"),
    Definition::factory("transient_tracker", tracker),
  )?;

  println!("--- Resolving Singletons ---");
  let s1 = container.get::<RequestTracker>(Key::named::<RequestTracker>("singleton"))?;
  let s2 = container.get::<RequestTracker>(Key::named::<RequestTracker>("singleton"))?;
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, s2.id);
  assert!(container.has_instance(Key::named::<RequestTracker>("singleton")));

  println!("\n--- Resolving Transients ---");
  let t1 = container.get::<RequestTracker>(Key::named::<RequestTracker>("transient"))?;
  let t2 = container.get::<RequestTracker>(Key::named::<RequestTracker>("transient"))?;
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_ne!(t1.id, t2.id);

  Ok(())
}
