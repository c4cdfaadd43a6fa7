use displaydoc::Display;
use serde::Deserialize;
use serde_json::Value;
use slog::{warn, Logger};
use std::{
    collections::BTreeMap,
    path::Path,
    process::{Command, ExitStatus},
};
use thiserror::Error;

#[derive(Error, Debug, Display)]
pub enum Error {
    /// mediainfo returned failed status code: {0}
    MediainfoCommandFailed(ExitStatus),
    /// io: {0}
    Io(#[from] std::io::Error),
    /// no general track found
    MissingGeneralTrack,
    /// serde_json: {0}
    JsonParseError(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Output {
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    track: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

/// String fields of a file's `General` track.
///
/// Entries mediainfo nests under `extra` (vendor atoms such as
/// `com_apple_quicktime_creationdate`) are lifted next to the standard ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneralTrack {
    fields: BTreeMap<String, String>,
}

impl GeneralTrack {
    pub fn get(path: &Path, logger: &Logger) -> Result<GeneralTrack, Error> {
        let output = Command::new("mediainfo")
            .arg("--Output=JSON")
            .arg(path)
            .output()?;
        if !output.status.success() {
            return Err(Error::MediainfoCommandFailed(output.status));
        }
        Self::from_json(&output.stdout, logger)
    }

    pub fn from_json(json: &[u8], logger: &Logger) -> Result<GeneralTrack, Error> {
        let output = serde_json::from_slice::<Output>(json)?;
        let mut general_tracks = output
            .media
            .map(|media| media.track)
            .unwrap_or_default()
            .into_iter()
            .filter(|track| track.kind == "General");
        let first = general_tracks.next().ok_or(Error::MissingGeneralTrack)?;
        if general_tracks.next().is_some() {
            warn!(logger, "multiple general tracks returned, ignoring all but first");
        }

        let mut fields = BTreeMap::new();
        for (key, value) in first.fields {
            match value {
                Value::String(s) => {
                    fields.insert(key, s);
                }
                Value::Object(extra) if key == "extra" => {
                    for (key, value) in extra {
                        if let Value::String(s) = value {
                            fields.insert(key, s);
                        }
                    }
                }
                _ => (),
            }
        }
        Ok(GeneralTrack { fields })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
