use crate::{
    config::ConfigError,
    record::{render_value, Record, RecordId},
    syncsketch::{RemoteServiceError, ReviewApi},
};
use std::{fmt::Display, str::FromStr};
use tracing::debug;

const CATALOGUE_FIELDS: [&str; 3] = ["id", "name", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Projects,
    Reviews,
    Items,
    Comments,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Projects,
        CollectionKind::Reviews,
        CollectionKind::Items,
        CollectionKind::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Projects => "projects",
            CollectionKind::Reviews => "reviews",
            CollectionKind::Items => "items",
            CollectionKind::Comments => "comments",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            CollectionKind::Projects => "\nProjects in this account:\n",
            CollectionKind::Reviews => "\nReviews in the Project Under Test:\n",
            CollectionKind::Items => "\nItems in the Review Under Test:\n",
            CollectionKind::Comments => "\nComments in the Item Under Test:\n",
        }
    }

    /// Next level down the tree; comments are the leaves.
    pub fn child(&self) -> Option<CollectionKind> {
        match self {
            CollectionKind::Projects => Some(CollectionKind::Reviews),
            CollectionKind::Reviews => Some(CollectionKind::Items),
            CollectionKind::Items => Some(CollectionKind::Comments),
            CollectionKind::Comments => None,
        }
    }
}

impl Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownCollection(s.to_owned()))
    }
}

/// The records of one level of the tree, fetched for a single parent.
#[derive(Debug, Clone)]
pub struct Collection {
    pub kind: CollectionKind,
    pub records: Vec<Record>,
}

impl Collection {
    pub fn fetch(
        api: &dyn ReviewApi,
        kind: CollectionKind,
        parent: Option<&RecordId>,
    ) -> Result<Self, RemoteServiceError> {
        // Nothing was selected one level up, so nothing hangs below it.
        let Some(parent) = parent else {
            debug!("no parent selected, {} left empty", kind);
            return Ok(Self::empty(kind));
        };

        let listing = match kind {
            CollectionKind::Projects => api.projects(parent)?,
            CollectionKind::Reviews => api.reviews(parent)?,
            CollectionKind::Items => api.items(parent)?,
            CollectionKind::Comments => api.comments(parent)?,
        };
        debug!("fetched {} {}", listing.objects.len(), kind);

        Ok(Self {
            kind,
            records: listing.objects,
        })
    }

    pub fn empty(kind: CollectionKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    pub fn header(&self) -> &'static str {
        self.kind.header()
    }

    pub fn catalogue(&self) -> String {
        let mut catalogue = String::from(self.header());
        for record in &self.records {
            catalogue.push('\t');
            catalogue.push_str(&catalogue_line(record));
            catalogue.push('\n');
        }
        catalogue.push('\n');
        catalogue
    }
}

fn catalogue_line(record: &Record) -> String {
    CATALOGUE_FIELDS
        .iter()
        .filter_map(|key| record.field(key))
        .map(render_value)
        .collect::<Vec<_>>()
        .join(" ")
}
