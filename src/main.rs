fn main() -> anyhow::Result<()> {
    pokedex_sync_lib::run()
}
