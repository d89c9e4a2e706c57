//! Configuration management for the Checkpoint driver.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use checkpoint::geofence::SiteRegistry;
use checkpoint::session::RandomPassVerifier;
use checkpoint::signing::RecordSigner;
use checkpoint_common::constants::DEFAULT_ACTION_PASS_RATE;
use checkpoint_common::{AllowedSite, ConfigError, GeoPoint};

/// Application configuration, as read from disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Places where check-in is allowed
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Liveness challenge configuration
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// Record signing configuration
    #[serde(default)]
    pub signing: SigningConfig,

    /// Identifier stamped on every record
    #[serde(default)]
    pub subject_id: Option<String>,
}

/// One `[[sites]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_radius")]
    pub radius_meters: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LivenessConfig {
    /// Probability that a timed action counts as followed
    #[serde(default = "default_pass_rate")]
    pub action_pass_rate: f64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            action_pass_rate: default_pass_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigningConfig {
    /// Raw 32-byte ed25519 secret key; ephemeral key if unset
    #[serde(default)]
    pub private_key_path: Option<String>,
}

// Default value functions
fn default_radius() -> f64 { 100.0 }
fn default_pass_rate() -> f64 { DEFAULT_ACTION_PASS_RATE }

/// Validated settings the engine is built from
pub struct EngineSettings {
    pub sites: SiteRegistry,
    pub verifier: RandomPassVerifier,
    pub signer: RecordSigner,
    pub subject_id: Option<String>,
}

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref subject) = args.subject {
            config.subject_id = Some(subject.clone());
        }
        if let Some(ref key_path) = args.signing_key {
            config.signing.private_key_path = Some(key_path.clone());
        }
        if let Some(pass_rate) = args.pass_rate {
            config.liveness.action_pass_rate = pass_rate;
        }

        Ok(config)
    }

    /// Check every setting and build the engine pieces. Any error is fatal.
    pub fn validate(&self) -> Result<EngineSettings, ConfigError> {
        let sites = self
            .sites
            .iter()
            .map(SiteConfig::to_allowed_site)
            .collect::<Result<Vec<_>, _>>()?;
        let sites = SiteRegistry::new(sites)?;
        let verifier = RandomPassVerifier::new(self.liveness.action_pass_rate)?;
        let signer = RecordSigner::load(self.signing.private_key_path.as_deref())
            .map_err(|e| ConfigError::SigningKey(format!("{e:#}")))?;

        Ok(EngineSettings {
            sites,
            verifier,
            signer,
            subject_id: self.subject_id.clone(),
        })
    }
}

impl SiteConfig {
    fn to_allowed_site(&self) -> Result<AllowedSite, ConfigError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(ConfigError::MissingCoordinates {
                site: self.name.clone(),
            });
        };

        Ok(AllowedSite {
            name: self.name.clone(),
            center: GeoPoint::new(latitude, longitude),
            radius_meters: self.radius_meters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn full_file_validates() {
        let config = parse(
            r#"
            subject_id = "student-001"

            [[sites]]
            name = "Main Campus"
            latitude = -8.15756
            longitude = 113.72278
            radius_meters = 100.0

            [[sites]]
            name = "Annex"
            latitude = -8.16
            longitude = 113.73

            [liveness]
            action_pass_rate = 0.9
            "#,
        );

        let settings = config.validate().unwrap();
        assert_eq!(settings.sites.sites().len(), 2);
        assert_eq!(settings.sites.sites()[1].radius_meters, 100.0);
        assert_eq!(settings.verifier.pass_rate(), 0.9);
        assert_eq!(settings.subject_id.as_deref(), Some("student-001"));
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = parse(
            r#"
            [[sites]]
            name = "Lab"
            latitude = 0.0
            longitude = 0.0
            radius_meters = 25.0
            "#,
        );
        assert_eq!(config.liveness.action_pass_rate, DEFAULT_ACTION_PASS_RATE);
        assert!(config.signing.private_key_path.is_none());
        assert!(config.subject_id.is_none());
    }

    #[test]
    fn empty_config_has_no_sites() {
        assert!(matches!(
            AppConfig::default().validate(),
            Err(ConfigError::NoSites)
        ));
    }

    #[test]
    fn site_errors_are_fatal() {
        let missing = parse(
            r#"
            [[sites]]
            name = "Lab"
            latitude = 0.0
            "#,
        );
        assert!(matches!(
            missing.validate(),
            Err(ConfigError::MissingCoordinates { site }) if site == "Lab"
        ));

        let zero_radius = parse(
            r#"
            [[sites]]
            name = "Lab"
            latitude = 0.0
            longitude = 0.0
            radius_meters = 0.0
            "#,
        );
        assert!(matches!(
            zero_radius.validate(),
            Err(ConfigError::InvalidRadius { .. })
        ));

        let off_globe = parse(
            r#"
            [[sites]]
            name = "Lab"
            latitude = 95.0
            longitude = 0.0
            "#,
        );
        assert!(matches!(
            off_globe.validate(),
            Err(ConfigError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn bad_pass_rate_and_key_are_fatal() {
        let mut config = parse(
            r#"
            [[sites]]
            name = "Lab"
            latitude = 0.0
            longitude = 0.0
            "#,
        );
        config.liveness.action_pass_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPassRate(_))
        ));

        config.liveness.action_pass_rate = 0.8;
        config.signing.private_key_path = Some("/nonexistent/checkpoint.key".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SigningKey(_))
        ));
    }
}
