use super::errors::{DomainError, DomainResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum::{EnumIter, EnumMessage, IntoEnumIterator, IntoStaticStr};

/// Behaviour shared by the fixed-choice fields of the form.
///
/// Every choice enum has an `Unselected` default whose code is the
/// `"selecione"` sentinel; the remaining variants are the accepted values.
pub trait Choice:
    Copy + PartialEq + Default + IntoEnumIterator + EnumMessage + Into<&'static str>
{
    /// Stable lowercase code, as stored.
    fn code(self) -> &'static str {
        self.into()
    }

    /// Human readable label for display.
    fn label(self) -> &'static str {
        self.get_message().unwrap_or_else(|| self.code())
    }

    fn is_selected(self) -> bool {
        self != Self::default()
    }

    /// Next (or previous) option, wrapping around through `Unselected`.
    fn cycle(self, forward: bool) -> Self {
        let all: Vec<Self> = Self::iter().collect();
        let pos = all.iter().position(|c| *c == self).unwrap_or(0);
        let next = if forward {
            (pos + 1) % all.len()
        } else {
            (pos + all.len() - 1) % all.len()
        };
        all[next]
    }

    /// Parses a stored code back into a choice, `None` for unknown codes.
    fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|c| c.code() == code)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, EnumMessage,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SkinColor {
    #[default]
    #[serde(rename = "selecione")]
    #[strum(to_string = "selecione", message = "Selecione")]
    Unselected,
    #[strum(message = "Negra")]
    Negra,
    #[strum(message = "Parda")]
    Parda,
    #[strum(message = "Branca")]
    Branca,
    #[strum(message = "Amarela")]
    Amarela,
    #[strum(message = "Indígena")]
    Indigena,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, EnumMessage,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HairColor {
    #[default]
    #[serde(rename = "selecione")]
    #[strum(to_string = "selecione", message = "Selecione")]
    Unselected,
    #[strum(message = "Preto")]
    Preto,
    #[strum(message = "Castanho")]
    Castanho,
    #[strum(message = "Loiro")]
    Loiro,
    #[strum(message = "Ruivo")]
    Ruivo,
    #[strum(message = "Grisalho")]
    Grisalho,
    #[strum(message = "Branco")]
    Branco,
    #[strum(message = "Outro")]
    Outro,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, EnumMessage,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EyeColor {
    #[default]
    #[serde(rename = "selecione")]
    #[strum(to_string = "selecione", message = "Selecione")]
    Unselected,
    #[strum(message = "Castanho")]
    Castanho,
    #[strum(message = "Preto")]
    Preto,
    #[strum(message = "Azul")]
    Azul,
    #[strum(message = "Verde")]
    Verde,
    #[strum(message = "Cinza")]
    Cinza,
    #[strum(message = "Mel")]
    Mel,
}

impl Choice for SkinColor {}
impl Choice for HairColor {}
impl Choice for EyeColor {}

/// Federal units offered as suggestions for the state fields.
pub const STATES: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

/// Returns the state code after (or before) `current`, wrapping around.
/// An unknown or empty value starts from the first entry.
pub fn cycle_state(current: &str, forward: bool) -> &'static str {
    let pos = STATES.iter().position(|(code, _)| code.eq_ignore_ascii_case(current.trim()));
    let next = match (pos, forward) {
        (None, true) => 0,
        (None, false) => STATES.len() - 1,
        (Some(p), true) => (p + 1) % STATES.len(),
        (Some(p), false) => (p + STATES.len() - 1) % STATES.len(),
    };
    STATES[next].0
}

/// Every field of the report form, in on-screen order.
///
/// The declaration order is significant: `Ord` follows it, so sorted
/// collections of fields come out in the order the operator sees them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    FullName,
    NationalId,
    Photo,
    MotherName,
    FatherName,
    YoungerSibling,
    OlderSibling,
    Phone,
    BirthCity,
    BirthState,
    Street,
    Neighborhood,
    City,
    State,
    Spouse,
    Children,
    SkinColor,
    HairColor,
    EyeColor,
    Height,
    Weight,
    Notes,
}

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text with a mask applied on every update.
    Masked,
    /// Text with a list of suggested values.
    StateCode,
    Choice,
    Photo,
    Children,
}

impl Field {
    /// Fields that must be filled before the form can be submitted.
    pub const REQUIRED: [Field; 5] = [
        Field::FullName,
        Field::MotherName,
        Field::SkinColor,
        Field::HairColor,
        Field::EyeColor,
    ];

    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::NationalId | Field::Phone => FieldKind::Masked,
            Field::BirthState | Field::State => FieldKind::StateCode,
            Field::SkinColor | Field::HairColor | Field::EyeColor => FieldKind::Choice,
            Field::Photo => FieldKind::Photo,
            Field::Children => FieldKind::Children,
            _ => FieldKind::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::FullName => "Nome Completo",
            Field::NationalId => "CPF",
            Field::Photo => "Foto Atual",
            Field::MotherName => "Nome da Mãe",
            Field::FatherName => "Nome do Pai",
            Field::YoungerSibling => "Irmão Mais Novo",
            Field::OlderSibling => "Irmão Mais Velho",
            Field::Phone => "Celular",
            Field::BirthCity => "Cidade de Nascimento",
            Field::BirthState => "Estado de Nascimento",
            Field::Street => "Endereço",
            Field::Neighborhood => "Bairro",
            Field::City => "Cidade",
            Field::State => "Estado",
            Field::Spouse => "Cônjuge",
            Field::Children => "Filhos",
            Field::SkinColor => "Cor da Pele",
            Field::HairColor => "Cor do Cabelo",
            Field::EyeColor => "Cor dos Olhos",
            Field::Height => "Altura",
            Field::Weight => "Peso",
            Field::Notes => "Observações",
        }
    }
}

/// Image formats accepted for the subject's photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoMime {
    Jpeg,
    Png,
}

impl PhotoMime {
    pub fn as_str(self) -> &'static str {
        match self {
            PhotoMime::Jpeg => "image/jpeg",
            PhotoMime::Png => "image/png",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(PhotoMime::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(PhotoMime::Jpeg)
        } else {
            None
        }
    }
}

/// The subject's photo together with its inline preview reference.
#[derive(Clone, PartialEq)]
pub struct Photo {
    pub file_name: String,
    pub mime: PhotoMime,
    bytes: Vec<u8>,
    preview: String,
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Photo {
    pub const MAX_BYTES: usize = 5 * 1024 * 1024;

    /// Builds a photo from raw image bytes, detecting the format from the
    /// file signature.
    ///
    /// # Errors
    ///
    /// Fails for files over [`Photo::MAX_BYTES`] and for anything that is not
    /// a JPEG or PNG image.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> DomainResult<Self> {
        let file_name = file_name.into();
        if bytes.len() > Self::MAX_BYTES {
            return Err(DomainError::PhotoTooLarge {
                size: bytes.len(),
                limit: Self::MAX_BYTES,
            });
        }
        let mime = PhotoMime::sniff(&bytes).ok_or_else(|| DomainError::UnsupportedPhoto(file_name.clone()))?;
        let preview = format!("data:{};base64,{}", mime.as_str(), STANDARD.encode(&bytes));
        Ok(Self {
            file_name,
            mime,
            bytes,
            preview,
        })
    }

    /// Reads and validates a photo from disk.
    pub fn load(path: &Path) -> DomainResult<Self> {
        let bytes = fs::read(path).map_err(|e| DomainError::PhotoRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(file_name, bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:` URL suitable for storing as the photo reference.
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

/// A missing-person report under construction.
///
/// The children list always keeps at least one (possibly empty) slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub full_name: String,
    pub national_id: String,
    pub photo: Option<Photo>,
    pub mother_name: String,
    pub father_name: String,
    pub younger_sibling: String,
    pub older_sibling: String,
    pub phone: String,
    pub birth_city: String,
    pub birth_state: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub spouse: String,
    children: Vec<String>,
    pub skin_color: SkinColor,
    pub hair_color: HairColor,
    pub eye_color: EyeColor,
    pub height: String,
    pub weight: String,
    pub notes: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            national_id: String::new(),
            photo: None,
            mother_name: String::new(),
            father_name: String::new(),
            younger_sibling: String::new(),
            older_sibling: String::new(),
            phone: String::new(),
            birth_city: String::new(),
            birth_state: String::new(),
            street: String::new(),
            neighborhood: String::new(),
            city: String::new(),
            state: String::new(),
            spouse: String::new(),
            children: vec![String::new()],
            skin_color: SkinColor::default(),
            hair_color: HairColor::default(),
            eye_color: EyeColor::default(),
            height: String::new(),
            weight: String::new(),
            notes: String::new(),
        }
    }
}

impl Record {
    /// Borrows the value of a free-text field.
    ///
    /// Returns `None` for photo, children and choice fields.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FullName => &self.full_name,
            Field::NationalId => &self.national_id,
            Field::MotherName => &self.mother_name,
            Field::FatherName => &self.father_name,
            Field::YoungerSibling => &self.younger_sibling,
            Field::OlderSibling => &self.older_sibling,
            Field::Phone => &self.phone,
            Field::BirthCity => &self.birth_city,
            Field::BirthState => &self.birth_state,
            Field::Street => &self.street,
            Field::Neighborhood => &self.neighborhood,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Spouse => &self.spouse,
            Field::Height => &self.height,
            Field::Weight => &self.weight,
            Field::Notes => &self.notes,
            Field::Photo
            | Field::Children
            | Field::SkinColor
            | Field::HairColor
            | Field::EyeColor => return None,
        };
        Some(value.as_str())
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let value = match field {
            Field::FullName => &mut self.full_name,
            Field::NationalId => &mut self.national_id,
            Field::MotherName => &mut self.mother_name,
            Field::FatherName => &mut self.father_name,
            Field::YoungerSibling => &mut self.younger_sibling,
            Field::OlderSibling => &mut self.older_sibling,
            Field::Phone => &mut self.phone,
            Field::BirthCity => &mut self.birth_city,
            Field::BirthState => &mut self.birth_state,
            Field::Street => &mut self.street,
            Field::Neighborhood => &mut self.neighborhood,
            Field::City => &mut self.city,
            Field::State => &mut self.state,
            Field::Spouse => &mut self.spouse,
            Field::Height => &mut self.height,
            Field::Weight => &mut self.weight,
            Field::Notes => &mut self.notes,
            Field::Photo
            | Field::Children
            | Field::SkinColor
            | Field::HairColor
            | Field::EyeColor => return None,
        };
        Some(value)
    }

    /// Stores `value` verbatim into a free-text field. Masking is the
    /// caller's job.
    pub fn set_text(&mut self, field: Field, value: String) -> DomainResult<()> {
        let slot = self.text_mut(field).ok_or(DomainError::NotTextField(field))?;
        *slot = value;
        Ok(())
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn add_child(&mut self) {
        self.children.push(String::new());
    }

    /// Removes a child slot. Removing the only slot leaves a single empty one.
    pub fn remove_child(&mut self, index: usize) -> DomainResult<()> {
        if index >= self.children.len() {
            return Err(DomainError::ChildOutOfRange(index));
        }
        self.children.remove(index);
        if self.children.is_empty() {
            self.children.push(String::new());
        }
        Ok(())
    }

    pub fn set_child(&mut self, index: usize, value: String) -> DomainResult<()> {
        let slot = self
            .children
            .get_mut(index)
            .ok_or(DomainError::ChildOutOfRange(index))?;
        *slot = value;
        Ok(())
    }

    /// Replaces the children list, keeping the one-slot minimum.
    pub fn set_children(&mut self, children: Vec<String>) {
        self.children = if children.is_empty() {
            vec![String::new()]
        } else {
            children
        };
    }

    /// `street - neighborhood, city/state`, as shown on the confirmation
    /// screen.
    pub fn formatted_address(&self) -> String {
        format!(
            "{} - {}, {}/{}",
            self.street, self.neighborhood, self.city, self.state
        )
    }
}
