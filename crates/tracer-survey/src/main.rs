fn main() -> anyhow::Result<()> {
    tracer_survey::cli::main()
}
