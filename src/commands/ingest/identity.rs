use crate::error::IngestError;

const PART_SEGMENTS: usize = 3;
const MATERIAL_SEGMENTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MaterialIdentity {
    pub material_id: String,
    pub vendor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartIdentity {
    pub material: MaterialIdentity,
    pub part_type: String,
    /// Filename stem as found on disk; uniqueness is case-insensitive.
    pub part_id: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum IdentityScope {
    Part,
    Material,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FileIdentity {
    Part(PartIdentity),
    Material(MaterialIdentity),
}

impl FileIdentity {
    pub fn material(&self) -> &MaterialIdentity {
        match self {
            Self::Part(part) => &part.material,
            Self::Material(material) => material,
        }
    }

    /// Key measurement rows are attributed to.
    pub fn owner_id(&self) -> &str {
        match self {
            Self::Part(part) => &part.part_id,
            Self::Material(material) => &material.material_id,
        }
    }
}

/// Derives identity from a filename stem of the form
/// `<material>_<vendor>_<part type>[_...]`.
pub(crate) fn extract_identity(
    stem: &str,
    scope: IdentityScope,
) -> Result<FileIdentity, IngestError> {
    match scope {
        IdentityScope::Part => extract_part_identity(stem).map(FileIdentity::Part),
        IdentityScope::Material => extract_material_identity(stem).map(FileIdentity::Material),
    }
}

pub(crate) fn extract_part_identity(stem: &str) -> Result<PartIdentity, IngestError> {
    let segments = split_segments(stem, PART_SEGMENTS)?;

    Ok(PartIdentity {
        material: material_from_segments(&segments),
        part_type: segments[2].to_lowercase(),
        part_id: stem.to_string(),
    })
}

pub(crate) fn extract_material_identity(stem: &str) -> Result<MaterialIdentity, IngestError> {
    let segments = split_segments(stem, MATERIAL_SEGMENTS)?;
    Ok(material_from_segments(&segments))
}

fn split_segments(stem: &str, required: usize) -> Result<Vec<&str>, IngestError> {
    let segments = stem.split('_').collect::<Vec<&str>>();
    if segments.len() < required {
        return Err(IngestError::MalformedFilename {
            stem: stem.to_string(),
            found: segments.len(),
            required,
        });
    }

    Ok(segments)
}

fn material_from_segments(segments: &[&str]) -> MaterialIdentity {
    MaterialIdentity {
        material_id: segments[..MATERIAL_SEGMENTS].join("_").to_lowercase(),
        vendor: segments[1].to_lowercase(),
    }
}
