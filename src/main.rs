fn main() -> std::process::ExitCode {
    ahi_lib::run()
}
