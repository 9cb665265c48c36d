fn main() -> anyhow::Result<()> {
    human_panic::setup_panic!();

    osmql::cli::run()
}
