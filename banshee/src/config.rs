//! The settings file. Anything the user may want to keep between runs lives here; anything that
//! changes per run is a command line flag.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use wraith::DmgPalette;
use wraith::Pixel;

/// The settings file. Every key is optional, and missing keys take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run the boot ROM at `boot_rom_path` before the game.
    pub use_boot_rom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_rom_path: Option<PathBuf>,
    pub dmg_color_1: Pixel,
    pub dmg_color_2: Pixel,
    pub dmg_color_3: Pixel,
    pub dmg_color_4: Pixel,
    /// Screenshots are scaled up by this factor.
    pub display_scale: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let DmgPalette([dmg_color_1, dmg_color_2, dmg_color_3, dmg_color_4]) = DmgPalette::GREEN;
        Self {
            use_boot_rom: false,
            boot_rom_path: None,
            dmg_color_1,
            dmg_color_2,
            dmg_color_3,
            dmg_color_4,
            display_scale: 4,
        }
    }
}

impl Settings {
    /// Reads the settings at `path`. If there is no file there yet, one is written with the
    /// defaults. A file that is missing some keys is rewritten with them filled in.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save(path)?;
            info!("Wrote default settings to {}", path.display());
            return Ok(settings);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = Self::parse(&contents)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        if settings.missing_keys(&contents)? {
            settings.save(path)?;
            info!("Added missing settings to {}", path.display());
        }
        Ok(settings)
    }

    /// Whether `contents` lacks any key these settings would write out.
    fn missing_keys(&self, contents: &str) -> anyhow::Result<bool> {
        let present: toml::Table = toml::from_str(contents)?;
        let expected = toml::Value::try_from(self)?;
        Ok(expected
            .as_table()
            .is_some_and(|table| table.keys().any(|key| !present.contains_key(key))))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }

    pub fn palette(&self) -> DmgPalette {
        DmgPalette([
            self.dmg_color_1,
            self.dmg_color_2,
            self.dmg_color_3,
            self.dmg_color_4,
        ])
    }

    /// The boot ROM to load, if any. A path given on the command line wins over the file.
    pub fn boot_rom<'a>(&'a self, cli: Option<&'a Path>) -> Option<&'a Path> {
        cli.or(self
            .boot_rom_path
            .as_deref()
            .filter(|_| self.use_boot_rom))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
        assert_eq!(Settings::default().palette(), DmgPalette::GREEN);
        assert_eq!(Settings::default().display_scale, 4);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::parse(
            r##"
            use_boot_rom = true
            boot_rom_path = "dmg_boot.bin"
            dmg_color_1 = "#FFFFFF"
            dmg_color_4 = "000000"
            display_scale = 2
            some_future_key = 7
            "##,
        )
        .unwrap();
        assert!(settings.use_boot_rom);
        assert_eq!(settings.display_scale, 2);
        assert_eq!(
            settings.palette(),
            DmgPalette([
                Pixel::WHITE,
                DmgPalette::GREEN.0[1],
                DmgPalette::GREEN.0[2],
                Pixel::BLACK
            ])
        );
        assert_eq!(settings.boot_rom(None), Some(Path::new("dmg_boot.bin")));
        assert_eq!(
            settings.boot_rom(Some(Path::new("other.bin"))),
            Some(Path::new("other.bin"))
        );
    }

    #[test]
    fn boot_rom_path_needs_the_flag() {
        let settings = Settings::parse(r#"boot_rom_path = "dmg_boot.bin""#).unwrap();
        assert_eq!(settings.boot_rom(None), None);
    }

    #[test]
    fn bad_colors_are_rejected() {
        let err = Settings::parse(r##"dmg_color_2 = "#12345""##).unwrap_err();
        assert!(err.to_string().contains("#12345"), "{err}");
    }

    #[test]
    fn missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banshee.toml");
        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
        assert_eq!(Settings::load_or_create(&path).unwrap(), settings);
    }

    #[test]
    fn missing_keys_are_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banshee.toml");
        std::fs::write(&path, "display_scale = 2\n").unwrap();
        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings.display_scale, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let table: toml::Table = toml::from_str(&contents).unwrap();
        for key in ["use_boot_rom", "dmg_color_1", "dmg_color_4", "display_scale"] {
            assert!(table.contains_key(key), "{key} missing from\n{contents}");
        }
        assert_eq!(Settings::parse(&contents).unwrap(), settings);
    }

    #[test]
    fn complete_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banshee.toml");
        let mut contents = toml::to_string_pretty(&Settings::default()).unwrap();
        contents.insert_str(0, "# my colors\n");
        std::fs::write(&path, &contents).unwrap();
        Settings::load_or_create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
    }
}
