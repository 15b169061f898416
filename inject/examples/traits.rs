use fibre_inject::{implements, injectable, Container};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation and declare the trait it is served as
struct ConsoleLogger;
injectable!(ConsoleLogger);
implements!(ConsoleLogger => dyn Logger);

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}
injectable!(ReportService { logger: dyn Logger });

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  // --- Registration ---
  let container = Container::new();

  // The container builds Arc<ConsoleLogger> and serves it as Arc<dyn Logger>.
  container.add_singleton::<dyn Logger, ConsoleLogger>();
  // ReportService never creates its own logger, it asks for one.
  container.add_exact_singleton::<ReportService>();

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = container.get::<ReportService>().expect("ReportService is registered");

  println!("Using the service...");
  report_service.generate_report();
}
