/// Abstraction over user-facing output.
///
/// Command modules use this trait instead of `println!`/`eprintln!` so tests
/// can capture what a command reported.
pub trait UserOutput: Send + Sync {
    /// Informational line
    fn status(&self, message: &str);

    fn success(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);

    /// Machine-readable payload, printed verbatim to stdout.
    fn data(&self, payload: &str);
}

/// Standard CLI output: stdout for results, stderr for problems.
pub struct CliOutput;

impl UserOutput for CliOutput {
    fn status(&self, message: &str) {
        println!("{}", message);
    }

    fn success(&self, message: &str) {
        println!("\x1b[32m{}\x1b[0m", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("\x1b[33m{}\x1b[0m", message);
    }

    fn error(&self, message: &str) {
        eprintln!("\x1b[31m{}\x1b[0m", message);
    }

    fn data(&self, payload: &str) {
        println!("{}", payload);
    }
}
