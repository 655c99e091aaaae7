fn main() -> anyhow::Result<()> {
    apex_installer::run()
}
