use anyhow::Context;
use mmrag_config::MmragConfig;

/// Load `.env`, every config layer, and fail fast on anything unusable.
pub fn load_config() -> anyhow::Result<MmragConfig> {
    let config = MmragConfig::load_with_dotenv().context("failed to load mmrag configuration")?;
    config
        .validate()
        .context("invalid mmrag configuration (see .mmrag/config.toml or MMRAG_* variables)")?;
    Ok(config)
}
