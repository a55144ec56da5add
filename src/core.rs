use crate::{
    collection::{Collection, CollectionKind},
    config::{Config, ConfigError, Credentials},
    prelude::*,
    record::{Record, RecordId},
    syncsketch::ReviewApi,
    utils::{account_header, connection_line, find_by_keyword},
};
use std::io::Write;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("no accounts are visible to this user")]
    NoAccounts,
    #[error("no {kind} name contains {keyword:?}")]
    NotFound {
        kind: CollectionKind,
        keyword: String,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub stop_after: Option<CollectionKind>,
    pub strict: bool,
}

/// Where the walk is. Fetching `kind` uses the id chosen by the previous
/// `Select`, or the account for projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    FetchAccounts,
    Fetch(CollectionKind),
    Select(CollectionKind),
    Done,
}

/// The account and every record picked on the way down.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    pub account: Record,
    pub selected: Vec<(CollectionKind, Record)>,
}

impl Trail {
    pub fn selected(&self, kind: CollectionKind) -> Option<&Record> {
        self.selected
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, rec)| rec)
    }
}

struct Walk<'a, W: Write> {
    api: &'a dyn ReviewApi,
    cfg: &'a Config,
    opts: WalkOptions,
    out: &'a mut W,
    parent: Option<RecordId>,
    current: Option<Collection>,
    trail: Trail,
}

impl<'a, W: Write> Walk<'a, W> {
    fn step(&mut self, stage: Stage) -> AnyhowResult<Stage> {
        use Stage::*;

        let next = match stage {
            Connect => {
                let connected = self.api.is_connected()?;
                writeln!(self.out, "{}", connection_line(connected))?;
                FetchAccounts
            }
            FetchAccounts => {
                let account = self
                    .api
                    .accounts()?
                    .objects
                    .into_iter()
                    .next()
                    .ok_or(WalkError::NoAccounts)?;
                writeln!(self.out, "{}", account_header(&account))?;
                self.parent = account.id();
                self.trail.account = account;
                Fetch(CollectionKind::Projects)
            }
            Fetch(kind) => {
                let collection = Collection::fetch(self.api, kind, self.parent.as_ref())?;
                writeln!(self.out, "{}", collection.catalogue())?;
                self.current = Some(collection);

                match self.cfg.keyword_for(kind) {
                    Some(_) if self.opts.stop_after != Some(kind) => Select(kind),
                    _ => Done,
                }
            }
            Select(kind) => {
                let keyword = self.cfg.keyword_for(kind).unwrap_or_default();
                let records = self
                    .current
                    .take()
                    .map(|c| c.records)
                    .unwrap_or_default();
                let chosen = find_by_keyword(&records, keyword);

                if chosen.is_empty() {
                    if self.opts.strict {
                        return Err(WalkError::NotFound {
                            kind,
                            keyword: keyword.to_owned(),
                        }
                        .into());
                    }
                    warn!(
                        "no {} name contains {:?}, nothing below it will be listed",
                        kind, keyword
                    );
                } else {
                    info!("{} under test: {}", kind, chosen.name().unwrap_or_default());
                }

                self.parent = chosen.id();
                self.trail.selected.push((kind, chosen));
                kind.child().map(Fetch).unwrap_or(Done)
            }
            Done => Done,
        };

        Ok(next)
    }
}

/// Walk accounts → projects → reviews → items → comments, printing each
/// catalogue to `out` and descending into the record each keyword picks.
pub fn walk_tree<W: Write>(
    api: &dyn ReviewApi,
    cfg: &Config,
    opts: WalkOptions,
    out: &mut W,
) -> AnyhowResult<Trail> {
    let mut walk = Walk {
        api,
        cfg,
        opts,
        out,
        parent: None,
        current: None,
        trail: Trail::default(),
    };

    let mut stage = Stage::Connect;
    while stage != Stage::Done {
        stage = walk.step(stage)?;
    }
    walk.out.flush()?;

    Ok(walk.trail)
}

/// Resolves credentials, then connects and walks. Nothing is connected
/// when a credential is missing.
pub fn run<A, L, C, W>(
    cfg: &Config,
    opts: WalkOptions,
    lookup_env: L,
    connect: C,
    out: &mut W,
) -> AnyhowResult<Trail>
where
    A: ReviewApi,
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&Config, &Credentials) -> AnyhowResult<A>,
    W: Write,
{
    let creds: Credentials = Credentials::from_lookup(lookup_env)?;
    info!("connecting to {} as {}", cfg.base_url, creds.username);
    let api = connect(cfg, &creds)?;
    walk_tree(&api, cfg, opts, out)
}

pub fn is_missing_credential(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingCredential { .. })
    )
}
