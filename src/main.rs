use std::process::ExitCode;

fn main() -> ExitCode {
    impl_synth::run_cli()
}
