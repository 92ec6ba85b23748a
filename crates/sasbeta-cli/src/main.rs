fn main() {
    std::process::exit(sasbeta_cli::run_from_env());
}
