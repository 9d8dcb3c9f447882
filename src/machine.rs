use std::fmt;

use crate::error::MalformedInputError;

/// Graphics backend encoded in the result file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererBackend {
    /// `-GL` suffix.
    OpenGl,
    /// `-VK` suffix.
    Vulkan,
}

impl RendererBackend {
    /// Suffix used in file names: `GL` or `VK`.
    pub fn code(self) -> &'static str {
        match self {
            RendererBackend::OpenGl => "GL",
            RendererBackend::Vulkan => "VK",
        }
    }

    fn from_suffix(stem: &str) -> Option<Self> {
        if stem.ends_with("-GL") {
            Some(RendererBackend::OpenGl)
        } else if stem.ends_with("-VK") {
            Some(RendererBackend::Vulkan)
        } else {
            None
        }
    }
}

impl fmt::Display for RendererBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Stable identity of a test machine, with and without its backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineIdentity {
    /// File name stem without the backend suffix.
    pub machine_id: String,
    /// File name stem including the backend suffix, e.g. `f00d-GL`.
    pub machine_id_with_renderer: String,
    /// Renderer backend from the suffix.
    pub backend: RendererBackend,
}

impl MachineIdentity {
    /// Derives the identity from a result file name such as `abcd1234-VK.json`.
    /// The `.json` extension is optional.
    pub fn from_file_name(file_name: &str) -> Result<Self, MalformedInputError> {
        let stem = file_name.strip_suffix(".json").unwrap_or(file_name);
        let backend = RendererBackend::from_suffix(stem).ok_or_else(|| {
            MalformedInputError::new(
                file_name,
                "file name must end in a backend suffix (-GL or -VK)",
            )
        })?;
        // Both suffixes are three ASCII bytes.
        let machine_id = &stem[..stem.len() - 3];
        if machine_id.is_empty() {
            return Err(MalformedInputError::new(
                file_name,
                "file name has no machine id before the backend suffix",
            ));
        }

        Ok(Self {
            machine_id: machine_id.to_string(),
            machine_id_with_renderer: stem.to_string(),
            backend,
        })
    }
}
