//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to config fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::file::{ConfigFile, ConfigFileError};
use super::size::parse_size;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("api_key") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.api_key = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid(
                    "provider",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.provider.base_url = v.to_string();
        }
    }

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        let s = Section::new("fetch", section);

        if let Some(zoom) = s.number::<u8>("zoom")? {
            if zoom > MAX_ZOOM {
                return Err(s.out_of_range("zoom", "must be between 0 and 22"));
            }
            config.grid = config.grid.with_zoom(zoom);
        }
        if let Some(size) = s.positive::<u32>("tile_size")? {
            config.grid = config.grid.with_tile_size_px(size);
        }
        if let Some(scale) = s.positive::<u32>("scale")? {
            config.grid = config.grid.with_scale(scale);
        }
        if let Some(crop) = s.number::<u32>("crop_bottom")? {
            config.grid = config.grid.with_crop_bottom_px(crop);
        }
        if let Some(resolution) = s.number::<f64>("resolution_m")? {
            if !resolution.is_finite() || resolution <= 0.0 {
                return Err(s.out_of_range("resolution_m", "must be a positive number of metres"));
            }
            config.grid = config.grid.with_resolution_m(resolution);
        }
        if let Some(attempts) = s.positive::<u32>("max_attempts")? {
            config.fetch = config.fetch.with_max_attempts(attempts);
        }
        if let Some(ms) = s.number::<u64>("initial_backoff_ms")? {
            config.fetch = config.fetch.with_initial_backoff(Duration::from_millis(ms));
        }
        if let Some(ms) = s.number::<u64>("request_delay_ms")? {
            config.fetch = config.fetch.with_request_delay(Duration::from_millis(ms));
        }
        if let Some(secs) = s.positive::<u64>("timeout_secs")? {
            config.fetch = config.fetch.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(q) = s.quality("tile_quality")? {
            config.fetch = config.fetch.with_tile_quality(q);
        }
        if let Some(q) = s.quality("bulk_tile_quality")? {
            config.fetch = config.fetch.with_bulk_tile_quality(q);
        }
        if let Some(n) = s.number::<usize>("bulk_tile_threshold")? {
            config.fetch = config.fetch.with_bulk_tile_threshold(n);
        }
        if let Some(n) = s.positive::<usize>("concurrency")? {
            config.fetch = config.fetch.with_concurrency(n);
        }
        if let Some(n) = s.positive::<usize>("max_tiles")? {
            config.grid = config.grid.with_max_tiles(n);
        }
    }

    // [distribute] section
    if let Some(section) = ini.section(Some("distribute")) {
        let s = Section::new("distribute", section);

        if let Some(n) = s.number::<usize>("workers")? {
            config.distribute = config.distribute.with_workers(n);
        }
        if let Some(n) = s.positive::<usize>("local_batch_size")? {
            config.distribute = config.distribute.with_local_batch_size(n);
        }
    }

    // [mosaic] section
    if let Some(section) = ini.section(Some("mosaic")) {
        let s = Section::new("mosaic", section);

        if let Some(bytes) = s.size("direct_threshold")? {
            config.mosaic = config.mosaic.with_direct_threshold_bytes(bytes);
        }
        if let Some(rows) = s.positive::<u32>("chunk_rows")? {
            config.mosaic = config.mosaic.with_chunk_rows(rows);
        }
        if let Some(q) = s.quality("progressive_quality")? {
            config.mosaic = config.mosaic.with_progressive_quality(q);
        }
        if let Some(bytes) = s.size("prescale_budget")? {
            config.mosaic = config.mosaic.with_prescale_budget_bytes(bytes);
        }
        if let Some(bytes) = s.size("target_size")? {
            if bytes == 0 {
                return Err(s.out_of_range("target_size", "must be greater than zero"));
            }
            config.compression = config.compression.with_target_bytes(bytes);
        }
        if let Some(q) = s.quality("start_quality")? {
            config.compression = config.compression.with_start_quality(q);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Typed accessors over one INI section.
struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, props: &'a Properties) -> Self {
        Self { name, props }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.props.get(key).map(str::trim)
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigFileError> {
        match self.raw(key) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| invalid(self.name, key, v, "must be a number")),
        }
    }

    fn positive<T>(&self, key: &str) -> Result<Option<T>, ConfigFileError>
    where
        T: FromStr + PartialOrd + Default,
    {
        match self.number::<T>(key)? {
            Some(n) if n <= T::default() => {
                Err(self.out_of_range(key, "must be greater than zero"))
            }
            other => Ok(other),
        }
    }

    fn quality(&self, key: &str) -> Result<Option<u8>, ConfigFileError> {
        match self.number::<u8>(key)? {
            Some(q) if !(1..=100).contains(&q) => {
                Err(self.out_of_range(key, "must be between 1 and 100"))
            }
            other => Ok(other),
        }
    }

    fn size(&self, key: &str) -> Result<Option<u64>, ConfigFileError> {
        match self.raw(key) {
            None => Ok(None),
            Some(v) => parse_size(v).map(Some).map_err(|_| {
                invalid(
                    self.name,
                    key,
                    v,
                    "expected format like '100MB', '2GB', or '512KB'",
                )
            }),
        }
    }

    fn out_of_range(&self, key: &str, reason: &str) -> ConfigFileError {
        invalid(self.name, key, self.raw(key).unwrap_or_default(), reason)
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        ConfigFile::from_ini_str(content)
    }

    #[test]
    fn test_empty_ini_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_fetch_section() {
        let config = parse(
            "[fetch]\n\
             zoom = 18\n\
             tile_size = 256\n\
             scale = 1\n\
             crop_bottom = 0\n\
             resolution_m = 50.5\n\
             max_attempts = 5\n\
             initial_backoff_ms = 250\n\
             timeout_secs = 30\n\
             tile_quality = 90\n\
             bulk_tile_quality = 45\n\
             bulk_tile_threshold = 100\n\
             concurrency = 4\n\
             max_tiles = 5000\n",
        )
        .unwrap();

        assert_eq!(config.grid.zoom(), 18);
        assert_eq!(config.grid.tile_size_px(), 256);
        assert_eq!(config.grid.scale(), 1);
        assert_eq!(config.grid.crop_bottom_px(), 0);
        assert_eq!(config.grid.resolution_m(), 50.5);
        assert_eq!(config.fetch.max_attempts(), 5);
        assert_eq!(config.fetch.initial_backoff(), Duration::from_millis(250));
        assert_eq!(config.fetch.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.fetch.tile_quality_for(99), 90);
        assert_eq!(config.fetch.tile_quality_for(100), 45);
        assert_eq!(config.fetch.concurrency(), 4);
        assert_eq!(config.grid.max_tiles(), 5000);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(
            parse("[fetch]\nconcurrency = 0\n"),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_mosaic_section_sizes() {
        let config = parse(
            "[mosaic]\n\
             direct_threshold = 1GB\n\
             target_size = 25MB\n\
             prescale_budget = 512MB\n\
             chunk_rows = 4\n\
             start_quality = 85\n",
        )
        .unwrap();

        assert_eq!(config.mosaic.direct_threshold_bytes(), 1024 * 1024 * 1024);
        assert_eq!(config.mosaic.prescale_budget_bytes(), 512 * 1024 * 1024);
        assert_eq!(config.mosaic.chunk_rows(), 4);
        assert_eq!(config.compression.target_bytes(), 25 * 1024 * 1024);
        assert_eq!(config.compression.start_quality(), 85);
    }

    #[test]
    fn test_distribute_section() {
        let config = parse("[distribute]\nworkers = 4\nlocal_batch_size = 10\n").unwrap();
        assert_eq!(config.distribute.workers(), 4);
        assert_eq!(config.distribute.local_batch_size(), 10);
    }

    #[test]
    fn test_blank_api_key_ignored() {
        let config = parse("[provider]\napi_key =   \n").unwrap();
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            "[fetch]\nzoom = 23\n",
            "[fetch]\nzoom = high\n",
            "[fetch]\nscale = 0\n",
            "[fetch]\nresolution_m = -1\n",
            "[fetch]\ntile_quality = 0\n",
            "[mosaic]\ntarget_size = lots\n",
            "[mosaic]\ntarget_size = 0\n",
            "[distribute]\nlocal_batch_size = 0\n",
            "[provider]\nbase_url = ftp://example.com\n",
        ];
        for case in cases {
            let err = parse(case).unwrap_err();
            assert!(
                matches!(err, ConfigFileError::InvalidValue { .. }),
                "expected InvalidValue for {case:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_value_message_names_key() {
        let err = parse("[fetch]\nmax_attempts = 0\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("fetch.max_attempts"));
        assert!(msg.contains("greater than zero"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/log/m.log"), PathBuf::from("/var/log/m.log"));
        assert!(!expand_tilde("~/m.log").starts_with("~"));
    }
}
