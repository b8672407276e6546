use std::ops::{Add, AddAssign};

/// Stylesheet or script a widget depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaAtom {
    Css(String),
    Js(String),
}

impl MediaAtom {
    pub fn css(url: &str) -> Self {
        Self::Css(url.to_owned())
    }

    pub fn js(url: &str) -> Self {
        Self::Js(url.to_owned())
    }

    pub fn render(&self) -> String {
        match self {
            Self::Css(url) => format!(
                r#"<link rel="stylesheet" type="text/css" href="{}"/>"#,
                html_escape::encode_double_quoted_attribute(url)
            ),
            Self::Js(url) => format!(
                r#"<script type="text/javascript" src="{}"></script>"#,
                html_escape::encode_double_quoted_attribute(url)
            ),
        }
    }
}

/// Ordered set of media atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Media {
    atoms: Vec<MediaAtom>,
}

impl Media {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, atom: MediaAtom) {
        if !self.atoms.contains(&atom) {
            self.atoms.push(atom);
        }
    }

    pub fn with(mut self, atom: MediaAtom) -> Self {
        self.insert(atom);
        self
    }

    pub fn atoms(&self) -> &[MediaAtom] {
        &self.atoms
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn render(&self) -> String {
        self.atoms
            .iter()
            .map(MediaAtom::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<MediaAtom> for Media {
    fn from_iter<I: IntoIterator<Item = MediaAtom>>(iter: I) -> Self {
        let mut media = Self::new();
        for atom in iter {
            media.insert(atom);
        }
        media
    }
}

impl AddAssign<&Media> for Media {
    fn add_assign(&mut self, other: &Media) {
        for atom in &other.atoms {
            self.insert(atom.clone());
        }
    }
}

impl Add<&Media> for Media {
    type Output = Media;

    fn add(mut self, other: &Media) -> Media {
        self += other;
        self
    }
}
