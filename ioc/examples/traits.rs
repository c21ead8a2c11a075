use std::sync::Arc;

use weave_ioc::{Arguments, Autowire, Class, Container, Key, Parameter, Result};

// --- Abstraction and Implementations ---
trait MessageSender: Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender;

impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

impl Autowire for EmailSender {
  fn parameters() -> Vec<Parameter> {
    Vec::new()
  }

  fn construct(_: Arguments) -> Result<Self> {
    Ok(EmailSender)
  }
}

struct SmsSender;

impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

impl Autowire for SmsSender {
  fn parameters() -> Vec<Parameter> {
    Vec::new()
  }

  fn construct(_: Arguments) -> Result<Self> {
    Ok(SmsSender)
  }
}

// A consumer that depends on the abstraction, not on either implementation.
struct Notifier {
  sender: Arc<dyn MessageSender>,
}

impl Autowire for Notifier {
  fn parameters() -> Vec<Parameter> {
    vec![Parameter::service::<dyn MessageSender>("sender")]
  }

  fn construct(args: Arguments) -> Result<Self> {
    Ok(Notifier {
      sender: args.get("sender")?,
    })
  }
}

fn main() -> Result<()> {
  let container = Container::new();

  // --- Registration ---
  // The default implementation answers for the trait itself, and both are
  // also available under their own names.
  container.bind_singleton(
    Key::of::<dyn MessageSender>(),
    Class::as_trait::<EmailSender, dyn MessageSender>(|s| s),
  )?;
  container.bind(
    Key::named::<dyn MessageSender>("sms"),
    Class::as_trait::<SmsSender, dyn MessageSender>(|s| s),
  )?;

  // --- Resolution ---
  let notifier = container.autowire::<Notifier>()?;
  let sms = container.get::<dyn MessageSender>(Key::named::<dyn MessageSender>("sms"))?;

  let result1 = notifier.sender.send("test@example.com", "Hello from Weave!");
  let result2 = sms.send("+123456789", "Hello from Weave!");

  println!("{}", result1);
  println!("{}", result2);

  assert!(result1.contains("email"));
  assert!(result2.contains("SMS"));
  Ok(())
}
