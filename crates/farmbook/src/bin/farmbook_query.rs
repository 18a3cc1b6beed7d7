//! farmbook-query - Query a farmbook record file.
//!
//! Thin wrapper over [`farmbook::cmd::query`].

fn main() -> std::process::ExitCode {
    farmbook::cmd::query::main()
}
