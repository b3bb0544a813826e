//! Pure helpers shared by the normalizers and the offline dataset.

pub(crate) mod acronym;
pub(crate) mod text;
