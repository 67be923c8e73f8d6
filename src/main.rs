//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run one command.
//! No business logic here; identity is resolved through the IdentityPort.

use chrono::TimeDelta;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use timeet::adapters::host_selection::RandomHostSelector;
use timeet::adapters::identity::ConfiguredIdentity;
use timeet::adapters::persistence::{MemoryStore, SqliteStore};
use timeet::domain::time::parse_hhmm;
use timeet::domain::{
    AgendaCreateRequest, AgendaId, AgendaType, MeetingCreateRequest, MeetingId, Member, MemberId,
    TimerCreateRequest, TimerId,
};
use timeet::ports::{
    AgendaRepository, IdentityPort, MeetingRepository, MemberRepository, ParticipantRepository,
    TimerRepository,
};
use timeet::shared::config::{AppConfig, StorageKind};
use timeet::usecases::{AgendaService, MeetingService, TimerService};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: timeet <command> [args]

  timers                                 list active timers
  timer-new <HH:mm>                      create a timer
  timer-start|timer-stop|timer-delete <id>
  timer-duration <id> <HH:mm>            change a stopped timer's target
  meetings                               list meetings
  meeting-new <title> [HH:mm]            create a meeting (estimated total optional)
  join|leave <meeting_id>                membership for the acting member
  finish <meeting_id> <HH:mm>            record the actual total
  participations                         meetings of the acting member
  agenda-add <meeting_id> <title> <HH:mm> [break]
  agenda-start|agenda-pause|agenda-cancel <id>
  agenda-complete <id> <HH:mm>
  report <meeting_id>                    estimated-vs-actual report";

#[derive(Debug, PartialEq)]
enum Command {
    Timers,
    TimerNew(TimeDelta),
    TimerStart(TimerId),
    TimerStop(TimerId),
    TimerDelete(TimerId),
    TimerDuration(TimerId, TimeDelta),
    Meetings,
    MeetingNew {
        title: String,
        estimated: Option<TimeDelta>,
    },
    Join(MeetingId),
    Leave(MeetingId),
    Finish(MeetingId, TimeDelta),
    Participations,
    AgendaAdd {
        meeting_id: MeetingId,
        request: AgendaCreateRequest,
    },
    AgendaStart(AgendaId),
    AgendaPause(AgendaId),
    AgendaCancel(AgendaId),
    AgendaComplete(AgendaId, TimeDelta),
    Report(MeetingId),
}

/// Repository ports backed by one store.
struct Stores {
    timers: Arc<dyn TimerRepository>,
    meetings: Arc<dyn MeetingRepository>,
    participants: Arc<dyn ParticipantRepository>,
    agendas: Arc<dyn AgendaRepository>,
    members: Arc<dyn MemberRepository>,
}

impl Stores {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TimerRepository
            + MeetingRepository
            + ParticipantRepository
            + AgendaRepository
            + MemberRepository
            + 'static,
    {
        Self {
            timers: store.clone(),
            meetings: store.clone(),
            participants: store.clone(),
            agendas: store.clone(),
            members: store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv::dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let cfg = AppConfig::load()?;

    // --- Storage ---
    let stores = match cfg.storage_or_default() {
        StorageKind::Sqlite => {
            let data_path = PathBuf::from(cfg.data_dir_or_default());
            let store = SqliteStore::connect(&data_path)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
            Stores::from_store(Arc::new(store))
        }
        StorageKind::Memory => {
            info!("using in-memory storage; nothing is persisted");
            Stores::from_store(Arc::new(MemoryStore::new()))
        }
    };

    // --- Identity: make sure the acting member exists, then resolve through the port ---
    let member_id = MemberId(cfg.member_id_or_default());
    if stores.members.find_by_id(member_id).await?.is_none() {
        let member = Member::new(member_id, cfg.member_nickname_or_default());
        stores.members.save(&member).await?;
        info!(member_id = %member_id, "registered acting member");
    }
    let identity: Arc<dyn IdentityPort> =
        Arc::new(ConfiguredIdentity::new(Arc::clone(&stores.members), member_id));

    // --- Services ---
    let host_selector = Arc::new(RandomHostSelector::from_seed(cfg.host_selection_seed));
    let timer_service = TimerService::new(Arc::clone(&stores.timers));
    let meeting_service = MeetingService::new(
        Arc::clone(&stores.meetings),
        Arc::clone(&stores.participants),
        Arc::clone(&stores.agendas),
        host_selector,
    );
    let agenda_service =
        AgendaService::new(Arc::clone(&stores.agendas), Arc::clone(&stores.meetings))
            .with_locks(meeting_service.locks());

    // --- Run ---
    match command {
        Command::Timers => print_json(&timer_service.find_all().await?),
        Command::TimerNew(duration) => print_json(
            &timer_service
                .create_timer(TimerCreateRequest::new(duration))
                .await?,
        ),
        Command::TimerStart(id) => print_json(&timer_service.start_timer(id).await?),
        Command::TimerStop(id) => print_json(&timer_service.stop_timer(id).await?),
        Command::TimerDelete(id) => print_json(&timer_service.delete_timer(id).await?),
        Command::TimerDuration(id, duration) => {
            print_json(&timer_service.change_duration(id, duration).await?)
        }
        Command::Meetings => print_json(&meeting_service.find_all().await?),
        Command::MeetingNew { title, estimated } => {
            let member = identity.current_member().await?;
            let request = MeetingCreateRequest {
                title,
                start_time: None,
                location: None,
                total_estimated_duration: estimated,
            };
            print_json(&meeting_service.create_meeting(request, &member).await?)
        }
        Command::Join(id) => {
            let member = identity.current_member().await?;
            print_json(&meeting_service.add_participant(id, &member).await?)
        }
        Command::Leave(id) => {
            let member = identity.current_member().await?;
            print_json(&meeting_service.remove_participant(id, &member).await?)
        }
        Command::Finish(id, actual) => {
            print_json(&meeting_service.finish_meeting(id, actual).await?)
        }
        Command::Participations => {
            let member = identity.current_member().await?;
            print_json(&meeting_service.participations(member.id).await?)
        }
        Command::AgendaAdd {
            meeting_id,
            request,
        } => print_json(&agenda_service.add_agenda(meeting_id, request).await?),
        Command::AgendaStart(id) => print_json(&agenda_service.start_agenda(id).await?),
        Command::AgendaPause(id) => print_json(&agenda_service.pause_agenda(id).await?),
        Command::AgendaCancel(id) => print_json(&agenda_service.cancel_agenda(id).await?),
        Command::AgendaComplete(id, actual) => {
            print_json(&agenda_service.complete_agenda(id, actual).await?)
        }
        Command::Report(id) => print_json(&meeting_service.create_report(id).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let arg = |i: usize| -> anyhow::Result<&str> {
        args.get(i)
            .map(String::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing argument #{i}"))
    };
    let id = |i: usize| -> anyhow::Result<i64> {
        let raw = arg(i)?;
        raw.parse::<i64>()
            .map_err(|_| anyhow::anyhow!("`{raw}` is not a numeric id"))
    };
    let duration = |i: usize| -> anyhow::Result<TimeDelta> {
        let raw = arg(i)?;
        parse_hhmm(raw).ok_or_else(|| anyhow::anyhow!("`{raw}` is not a HH:mm duration"))
    };

    let command = match arg(0)? {
        "timers" => Command::Timers,
        "timer-new" => Command::TimerNew(duration(1)?),
        "timer-start" => Command::TimerStart(TimerId(id(1)?)),
        "timer-stop" => Command::TimerStop(TimerId(id(1)?)),
        "timer-delete" => Command::TimerDelete(TimerId(id(1)?)),
        "timer-duration" => Command::TimerDuration(TimerId(id(1)?), duration(2)?),
        "meetings" => Command::Meetings,
        "meeting-new" => Command::MeetingNew {
            title: arg(1)?.to_string(),
            estimated: if args.len() > 2 { Some(duration(2)?) } else { None },
        },
        "join" => Command::Join(MeetingId(id(1)?)),
        "leave" => Command::Leave(MeetingId(id(1)?)),
        "finish" => Command::Finish(MeetingId(id(1)?), duration(2)?),
        "participations" => Command::Participations,
        "agenda-add" => Command::AgendaAdd {
            meeting_id: MeetingId(id(1)?),
            request: AgendaCreateRequest {
                title: arg(2)?.to_string(),
                estimated_duration: duration(3)?,
                kind: match args.get(4).map(String::as_str) {
                    None | Some("agenda") => AgendaType::Agenda,
                    Some("break") => AgendaType::Break,
                    Some(other) => anyhow::bail!("unknown agenda type `{other}`"),
                },
            },
        },
        "agenda-start" => Command::AgendaStart(AgendaId(id(1)?)),
        "agenda-pause" => Command::AgendaPause(AgendaId(id(1)?)),
        "agenda-cancel" => Command::AgendaCancel(AgendaId(id(1)?)),
        "agenda-complete" => Command::AgendaComplete(AgendaId(id(1)?), duration(2)?),
        "report" => Command::Report(MeetingId(id(1)?)),
        other => anyhow::bail!("unknown command `{other}`"),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_timer_commands() {
        assert_eq!(
            parse_command(&args(&["timer-new", "00:30"])).unwrap(),
            Command::TimerNew(TimeDelta::minutes(30))
        );
        assert_eq!(
            parse_command(&args(&["timer-duration", "3", "00:45"])).unwrap(),
            Command::TimerDuration(TimerId(3), TimeDelta::minutes(45))
        );
    }

    #[test]
    fn parses_agenda_add_with_default_type() {
        let cmd = parse_command(&args(&["agenda-add", "1", "Intro", "00:10"])).unwrap();
        match cmd {
            Command::AgendaAdd {
                meeting_id,
                request,
            } => {
                assert_eq!(meeting_id, MeetingId(1));
                assert_eq!(request.kind, AgendaType::Agenda);
                assert_eq!(request.estimated_duration, TimeDelta::minutes(10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command(&args(&[])).is_err());
        assert!(parse_command(&args(&["report", "abc"])).is_err());
        assert!(parse_command(&args(&["timer-new", "soon"])).is_err());
        assert!(parse_command(&args(&["dance"])).is_err());
    }
}
