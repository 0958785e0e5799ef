fn main() -> anyhow::Result<()> {
    vivid_blog::cli::run()
}
