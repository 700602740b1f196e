use std::fmt::Write as _;

use milestone_data::advancement::{CriterionKind, TriggerContext};
use milestone_util::resource_location::ResourceLocation;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::advancement::{AdvancementEvent, AdvancementRegistry, PlayerAdvancementTracker};
use crate::error::{CommandError, StorageError};
use crate::server::AdvancementServer;

const ADVANCEMENT_USAGE: &str = "advancement (grant|revoke) <player> (everything|only <advancement> [<criterion>]|from|through|until <advancement>) | advancement score <player> <advancement> <criterion> <delta> | advancement progress <player> <advancement> | advancement list <player>";
const TRIGGER_USAGE: &str = "trigger <player> <trigger> [<key>=<value> ...]";

/// Which advancements a grant or revoke applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Everything,
    Only {
        advancement: ResourceLocation,
        criterion: Option<String>,
    },
    /// The advancement and everything below it.
    From(ResourceLocation),
    /// The advancement with its ancestors and descendants.
    Through(ResourceLocation),
    /// The advancement and everything above it.
    Until(ResourceLocation),
}

#[derive(Debug, Clone)]
pub enum Command {
    Grant {
        player: String,
        selection: Selection,
    },
    Revoke {
        player: String,
        selection: Selection,
    },
    Score {
        player: String,
        advancement: ResourceLocation,
        criterion: String,
        delta: i32,
    },
    Progress {
        player: String,
        advancement: ResourceLocation,
    },
    List {
        player: String,
    },
    Trigger {
        player: String,
        context: TriggerContext,
    },
    Save,
    Stop,
    Help,
}

impl Command {
    /// Parses one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = args.split_first() else {
            return Ok(None);
        };
        let command = match name.trim_start_matches('/') {
            "advancement" => parse_advancement(args)?,
            "trigger" => parse_trigger(args)?,
            "save" | "save-all" => Self::Save,
            "stop" | "exit" => Self::Stop,
            "help" | "?" => Self::Help,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Runs the command and returns the feedback for the console.
    pub fn execute(self, server: &mut AdvancementServer) -> Result<String, CommandError> {
        match self {
            Self::Grant { player, selection } => change(server, &player, &selection, true),
            Self::Revoke { player, selection } => change(server, &player, &selection, false),
            Self::Score {
                player,
                advancement,
                criterion,
                delta,
            } => {
                ensure_criterion(&server.registry, &advancement, &criterion)?;
                let events = server.update(&player, |registry, tracker| {
                    tracker.add_score(registry, &advancement, &criterion, delta)
                })?;
                let score = loaded(server, &player)?
                    .score(&server.registry, &advancement, &criterion)
                    .unwrap_or_default();
                Ok(format!(
                    "{criterion} of {advancement} is now {score} for {player}{}",
                    if events.is_empty() { " (unchanged)" } else { "" }
                ))
            }
            Self::Progress {
                player,
                advancement,
            } => progress(server, &player, &advancement),
            Self::List { player } => list(server, &player),
            Self::Trigger { player, context } => {
                if !server.registry.triggers().contains(&context.trigger) {
                    return Err(CommandError::UnknownTrigger(context.trigger));
                }
                let events = server.trigger(&player, &context)?;
                Ok(describe(&player, &events))
            }
            Self::Save => Ok(format!("Saved {} player(s)", server.save_all())),
            Self::Stop => Ok("Stopping".to_string()),
            Self::Help => Ok(format!(
                "Commands:\n  {ADVANCEMENT_USAGE}\n  {TRIGGER_USAGE}\n  save\n  stop"
            )),
        }
    }
}

fn parse_advancement(args: &[&str]) -> Result<Command, CommandError> {
    let usage = CommandError::Usage(ADVANCEMENT_USAGE);
    match args {
        [action @ ("grant" | "revoke"), player, rest @ ..] => {
            let selection = match rest {
                ["everything"] => Selection::Everything,
                ["only", advancement] => Selection::Only {
                    advancement: ResourceLocation::parse(advancement)?,
                    criterion: None,
                },
                ["only", advancement, criterion] => Selection::Only {
                    advancement: ResourceLocation::parse(advancement)?,
                    criterion: Some((*criterion).to_string()),
                },
                ["from", advancement] => Selection::From(ResourceLocation::parse(advancement)?),
                ["through", advancement] => {
                    Selection::Through(ResourceLocation::parse(advancement)?)
                }
                ["until", advancement] => Selection::Until(ResourceLocation::parse(advancement)?),
                _ => return Err(usage),
            };
            let player = (*player).to_string();
            Ok(if *action == "grant" {
                Command::Grant { player, selection }
            } else {
                Command::Revoke { player, selection }
            })
        }
        ["score", player, advancement, criterion, delta] => Ok(Command::Score {
            player: (*player).to_string(),
            advancement: ResourceLocation::parse(advancement)?,
            criterion: (*criterion).to_string(),
            delta: delta
                .parse()
                .map_err(|_| CommandError::InvalidNumber((*delta).to_string()))?,
        }),
        ["progress", player, advancement] => Ok(Command::Progress {
            player: (*player).to_string(),
            advancement: ResourceLocation::parse(advancement)?,
        }),
        ["list", player] => Ok(Command::List {
            player: (*player).to_string(),
        }),
        _ => Err(usage),
    }
}

/// `key=value` pairs become event data: booleans, integers and floats are
/// recognised, `effects` takes a comma separated list and anything else is
/// kept as a string.
fn parse_trigger(args: &[&str]) -> Result<Command, CommandError> {
    let [player, trigger, data @ ..] = args else {
        return Err(CommandError::Usage(TRIGGER_USAGE));
    };
    let mut context = TriggerContext::new(ResourceLocation::parse(trigger)?);
    for pair in data {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CommandError::Usage(TRIGGER_USAGE));
        };
        context = if key == "effects" {
            context.with_effects(value.split(',').filter(|effect| !effect.is_empty()))
        } else if let Ok(value) = value.parse::<bool>() {
            context.with_bool(key, value)
        } else if let Ok(value) = value.parse::<i64>() {
            context.with_int(key, value)
        } else if let Ok(value) = value.parse::<f64>() {
            context.with_float(key, value)
        } else {
            context.with_string(key, value)
        };
    }
    Ok(Command::Trigger {
        player: (*player).to_string(),
        context,
    })
}

fn loaded<'a>(
    server: &'a AdvancementServer,
    player: &str,
) -> Result<&'a PlayerAdvancementTracker, CommandError> {
    server
        .loaded_player(player)
        .ok_or_else(|| StorageError::InvalidPlayerName(player.to_string()).into())
}

fn ensure_advancement(
    registry: &AdvancementRegistry,
    id: &ResourceLocation,
) -> Result<(), CommandError> {
    if registry.contains(id) {
        Ok(())
    } else {
        Err(CommandError::UnknownAdvancement(id.clone()))
    }
}

fn ensure_criterion(
    registry: &AdvancementRegistry,
    id: &ResourceLocation,
    criterion: &str,
) -> Result<(), CommandError> {
    let placed = registry
        .get(id)
        .ok_or_else(|| CommandError::UnknownAdvancement(id.clone()))?;
    if placed.tree.contains(criterion) || placed.tree.owner_of(criterion).is_some() {
        Ok(())
    } else {
        Err(CommandError::UnknownCriterion {
            advancement: id.clone(),
            criterion: criterion.to_string(),
        })
    }
}

/// Resolves a selection to advancement ids, parents before children.
fn select(
    registry: &AdvancementRegistry,
    selection: &Selection,
) -> Result<Vec<ResourceLocation>, CommandError> {
    let ids = match selection {
        Selection::Everything => registry.ids(),
        Selection::Only { advancement, .. } => {
            ensure_advancement(registry, advancement)?;
            vec![advancement.clone()]
        }
        Selection::From(id) => {
            ensure_advancement(registry, id)?;
            let mut ids = vec![id.clone()];
            ids.extend(registry.descendants(id));
            ids
        }
        Selection::Until(id) | Selection::Through(id) => {
            ensure_advancement(registry, id)?;
            let mut ids: Vec<ResourceLocation> = registry.ancestors(id).into_iter().rev().collect();
            ids.push(id.clone());
            if matches!(selection, Selection::Through(_)) {
                ids.extend(registry.descendants(id));
            }
            ids
        }
    };
    Ok(ids)
}

fn change(
    server: &mut AdvancementServer,
    player: &str,
    selection: &Selection,
    grant: bool,
) -> Result<String, CommandError> {
    if let Selection::Only {
        advancement,
        criterion: Some(criterion),
    } = selection
    {
        ensure_criterion(&server.registry, advancement, criterion)?;
        let events = server.update(player, |registry, tracker| {
            if grant {
                tracker.grant_criterion(registry, advancement, criterion)
            } else {
                tracker.revoke_criterion(registry, advancement, criterion)
            }
        })?;
        return Ok(match (events.is_empty(), grant) {
            (true, true) => format!("{player} already has `{criterion}` of {advancement}"),
            (true, false) => format!("{player} does not have `{criterion}` of {advancement}"),
            (false, true) => format!("Granted `{criterion}` of {advancement} to {player}"),
            (false, false) => format!("Revoked `{criterion}` of {advancement} from {player}"),
        });
    }

    let ids = select(&server.registry, selection)?;
    let events = server.update(player, |registry, tracker| {
        ids.iter()
            .flat_map(|id| {
                if grant {
                    tracker.grant_advancement(registry, id)
                } else {
                    tracker.revoke_advancement(registry, id)
                }
            })
            .collect()
    })?;
    Ok(describe(player, &events))
}

fn describe(player: &str, events: &[AdvancementEvent]) -> String {
    let mut achieved = 0;
    let mut revoked = 0;
    let mut criteria = 0;
    for event in events {
        match event {
            AdvancementEvent::Achieved { .. } => achieved += 1,
            AdvancementEvent::Revoked { .. } => revoked += 1,
            _ => criteria += 1,
        }
    }
    if events.is_empty() {
        return format!("Nothing changed for {player}");
    }
    format!(
        "{player}: {criteria} criterion change(s), {achieved} advancement(s) completed, {revoked} revoked"
    )
}

fn progress(
    server: &mut AdvancementServer,
    player: &str,
    id: &ResourceLocation,
) -> Result<String, CommandError> {
    server.player(player)?;
    let Some(placed) = server.registry.get(id) else {
        return Err(CommandError::UnknownAdvancement(id.clone()));
    };
    let Some(progress) = loaded(server, player)?.get_progress(id) else {
        return Err(CommandError::UnknownAdvancement(id.clone()));
    };

    let mut out = format!(
        "{} for {player}: {:.0}%",
        placed.entry.name(),
        progress.get_percent(&placed.tree) * 100.0
    );
    let obtained = progress.get_obtained_criteria().len();
    let stored = placed.tree.stored_names().len();
    let _ = write!(out, "\n  {obtained}/{stored} stored criteria obtained");
    if let Some(started) = progress
        .get_earliest_progress_time()
        .and_then(format_millis)
    {
        let _ = write!(out, ", first at {started}");
    }
    for name in placed.tree.criterion_names() {
        let state = match placed.tree.kind(name) {
            Some(CriterionKind::Dummy) => "always".to_string(),
            Some(CriterionKind::Score { .. }) => {
                let goal = placed
                    .tree
                    .score_expansion(name)
                    .map_or(0, |score| score.goal());
                let score = placed.tree.score(progress, name).unwrap_or_default();
                format!("{score}/{goal}")
            }
            Some(CriterionKind::Defaulted { trigger }) => {
                let state = if placed.tree.is_criterion_done(progress, name) {
                    "obtained"
                } else {
                    "missing"
                };
                format!("{state} ({trigger})")
            }
            None => continue,
        };
        let _ = write!(out, "\n  {name}: {state}");
    }
    Ok(out)
}

/// Formats a unix time in milliseconds as a UTC timestamp.
fn format_millis(millis: i64) -> Option<String> {
    let time = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()?;
    time.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    ))
    .ok()
}

fn list(server: &mut AdvancementServer, player: &str) -> Result<String, CommandError> {
    server.player(player)?;
    let ids = server.registry.ids();
    let tracker = loaded(server, player)?;

    let mut out = format!(
        "{player} has completed {}/{} advancement(s)",
        tracker.completed_advancements().len(),
        ids.len()
    );
    for id in &ids {
        let mark = if tracker.is_completed(id) {
            'x'
        } else if tracker.is_visible(id) {
            ' '
        } else {
            '?'
        };
        let percent = tracker.percent(&server.registry, id) * 100.0;
        let name = server
            .registry
            .get(id)
            .map_or_else(|| id.to_string(), |placed| placed.entry.name());
        let _ = write!(out, "\n  [{mark}] {id} {name} ({percent:.0}%)");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MilestoneConfig;
    use tempfile::tempdir;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    fn server(dir: &std::path::Path) -> AdvancementServer {
        let pack = dir.join("pack/data/milestone/advancement");
        std::fs::create_dir_all(&pack).unwrap();
        std::fs::write(
            pack.join("root.json"),
            r#"{"criteria": {"start": {"trigger": "minecraft:tick"}}}"#,
        )
        .unwrap();
        std::fs::write(
            pack.join("counting.json"),
            r#"{
                "parent": "milestone:root",
                "criteria": {
                    "counter": {"trigger": "milestone:score", "conditions": {"score": 5}},
                    "bypass": {"trigger": "minecraft:impossible"}
                },
                "requirements": [["counter", "bypass"]]
            }"#,
        )
        .unwrap();
        std::fs::write(
            pack.join("counting_more.json"),
            r#"{"parent": "milestone:counting", "criteria": {"counter": {"trigger": "milestone:score", "conditions": {"score": 8}}}}"#,
        )
        .unwrap();

        let mut server = AdvancementServer::new(MilestoneConfig {
            datapacks: vec![dir.join("pack")],
            player_data: dir.join("players"),
            announce_advancements: false,
            ..MilestoneConfig::default()
        });
        server.load_datapacks();
        server
    }

    fn id(path: &str) -> ResourceLocation {
        ResourceLocation::new("milestone", path)
    }

    #[test]
    fn parses_advancement_commands() {
        assert!(matches!(
            parse("advancement grant Steve only milestone:counting bypass"),
            Command::Grant {
                selection: Selection::Only { criterion: Some(_), .. },
                ..
            }
        ));
        assert!(matches!(
            parse("/advancement revoke Steve through milestone:counting"),
            Command::Revoke {
                selection: Selection::Through(_),
                ..
            }
        ));
        assert!(matches!(
            parse("advancement score Steve milestone:counting counter -2"),
            Command::Score { delta: -2, .. }
        ));
        assert!(Command::parse("   ").unwrap().is_none());
        assert!(matches!(
            Command::parse("advancement grant Steve sideways"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            Command::parse("advancement score Steve milestone:counting counter lots"),
            Err(CommandError::InvalidNumber(_))
        ));
        assert!(matches!(
            Command::parse("fly"),
            Err(CommandError::UnknownCommand(_))
        ));
    }

    #[test]
    fn parses_trigger_data() {
        let line =
            "trigger Alex minecraft:inventory_changed item=minecraft:dirt count=64 flying=false";
        let Command::Trigger { context, .. } = parse(line) else {
            panic!("expected a trigger command");
        };
        assert_eq!(context.id("item").as_deref(), Some("minecraft:dirt"));
        assert_eq!(context.int("count"), Some(64));
        assert!(context.data.contains_key("flying"));
    }

    #[test]
    fn until_grants_ancestors() {
        let dir = tempdir().unwrap();
        let mut server = server(dir.path());

        parse("advancement grant Steve until milestone:counting_more")
            .execute(&mut server)
            .unwrap();
        let tracker = server.player("Steve").unwrap();
        for path in ["root", "counting", "counting_more"] {
            assert!(tracker.is_completed(&id(path)), "{path}");
        }

        parse("advancement revoke Steve from milestone:counting")
            .execute(&mut server)
            .unwrap();
        let tracker = server.player("Steve").unwrap();
        assert!(tracker.is_completed(&id("root")));
        assert!(!tracker.is_completed(&id("counting")));
        assert!(!tracker.is_completed(&id("counting_more")));
    }

    #[test]
    fn score_and_progress() {
        let dir = tempdir().unwrap();
        let mut server = server(dir.path());

        let out = parse("advancement score Steve milestone:counting counter 9")
            .execute(&mut server)
            .unwrap();
        assert_eq!(out, "counter of milestone:counting is now 5 for Steve");

        let out = parse("advancement progress Steve milestone:counting")
            .execute(&mut server)
            .unwrap();
        assert!(out.contains("counter: 5/5"), "{out}");
        assert!(out.contains("5/6 stored criteria obtained, first at "), "{out}");
        assert!(out.contains("bypass: missing"), "{out}");

        let list = parse("advancement list Steve").execute(&mut server).unwrap();
        assert!(list.starts_with("Steve has completed 1/3"), "{list}");
        assert!(list.contains("[x] milestone:counting"), "{list}");
    }

    #[test]
    fn progress_without_obtained_criteria_has_no_start() {
        let dir = tempdir().unwrap();
        let mut server = server(dir.path());
        let out = parse("advancement progress Steve milestone:counting_more")
            .execute(&mut server)
            .unwrap();
        assert!(out.ends_with("0/8 stored criteria obtained\n  counter: 0/8"), "{out}");
        assert_eq!(format_millis(0).as_deref(), Some("1970-01-01 00:00:00 UTC"));
    }

    #[test]
    fn unknown_targets_are_reported() {
        let dir = tempdir().unwrap();
        let mut server = server(dir.path());

        assert!(matches!(
            parse("advancement grant Steve only milestone:nope").execute(&mut server),
            Err(CommandError::UnknownAdvancement(_))
        ));
        assert!(matches!(
            parse("advancement grant Steve only milestone:counting nope").execute(&mut server),
            Err(CommandError::UnknownCriterion { .. })
        ));
        assert!(matches!(
            parse("trigger Steve mod:custom").execute(&mut server),
            Err(CommandError::UnknownTrigger(_))
        ));
    }

    #[test]
    fn trigger_grants_matching_criteria() {
        let dir = tempdir().unwrap();
        let mut server = server(dir.path());

        let out = parse("trigger Steve minecraft:tick").execute(&mut server).unwrap();
        assert_eq!(
            out,
            "Steve: 1 criterion change(s), 1 advancement(s) completed, 0 revoked"
        );
        assert_eq!(
            parse("trigger Steve minecraft:tick").execute(&mut server).unwrap(),
            "Nothing changed for Steve"
        );
    }
}
