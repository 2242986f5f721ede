fn main() -> anyhow::Result<()> {
    flowlens::run()
}
