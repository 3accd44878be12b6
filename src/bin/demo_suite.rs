// Verita demonstration runner: builds the bundled demo suite and maps the
// suite counters to the process exit code.
// Usage: cargo run --bin demo_suite [--details] [--json] [--with-failures]

use clap::Parser;

use verita::{
    check_approx_equal, check_equal, check_greater_or_equal, check_less, check_n_diagnostics,
    check_n_raised_warnings, check_no_diagnostics, check_not_equal, check_some_raised_errors,
    check_true, raise_error, raise_warning,
};
use verita::{TestCase, TestSuite};

/// Runs the bundled demonstration test suite.
#[derive(Debug, Parser)]
#[command(name = "demo_suite", version)]
struct DemoArgs {
    /// Print per-check details instead of the terse one-line-per-check mode.
    #[arg(long)]
    details: bool,

    /// Emit a JSON summary of the suite counters after the run.
    #[arg(long)]
    json: bool,

    /// Include a case with intentionally failing and erroring checks, to
    /// demonstrate failure reporting and the nonzero exit code.
    #[arg(long)]
    with_failures: bool,
}

fn build_demo_suite(with_failures: bool) -> TestSuite {
    let mut suite = TestSuite::new("demo_suite");

    suite.register(
        "comparisons",
        TestCase::new("comparisons", |t| {
            check_equal!(t, 1 + 1, 2);
            check_not_equal!(t, 2 * 3, 7);
            check_less!(t, 1, 2);
            check_greater_or_equal!(t, 5, 5);
            check_approx_equal!(t, 0.3, 0.1 + 0.2);
        }),
    );

    suite.register(
        "diagnostic_interception",
        TestCase::new("diagnostic_interception", |t| {
            let faulty = || {
                raise_error!("demo fault");
                -1
            };
            check_some_raised_errors!(t, faulty());
            check_n_diagnostics!(t, faulty(), 1);
            check_n_raised_warnings!(t, raise_warning!("demo advisory"), 1);
            check_no_diagnostics!(t, 1 + 1);
        }),
    );

    suite.register(
        "manual_checks",
        TestCase::new("manual_checks", |t| {
            t.pass_with(3, "externally verified fixtures");
        }),
    );

    if with_failures {
        suite.register(
            "expected_failures",
            TestCase::new("expected_failures", |t| {
                check_equal!(t, 1, 2);
                // Exact float equality is the classic trap the approximate
                // check exists for.
                check_equal!(t, 0.3, 0.1 + 0.2);
                let noisy_true = || {
                    raise_error!("stray diagnostic");
                    true
                };
                check_true!(t, noisy_true());
            }),
        );
    }

    suite
}

fn main() {
    let args = DemoArgs::parse();

    let mut suite = build_demo_suite(args.with_failures);
    suite.set_suppress_details(!args.details);
    suite.run_all();

    if args.json {
        if let Ok(json) = serde_json::to_string_pretty(&suite.summary()) {
            println!("{json}");
        }
    }

    if let Err(failure) = suite.require_passed() {
        eprintln!("{failure}");
        std::process::exit(1);
    }
}
