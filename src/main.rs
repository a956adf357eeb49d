use storage_schema::cli::CommandLineInterface;

fn main() -> anyhow::Result<()> {
    CommandLineInterface::load().run()
}
