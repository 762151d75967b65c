use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::RosterError;
use crate::grading;
use crate::record;
use crate::roster::{Lecture, LectureView};
use crate::validate::{parse_points, PointDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Global,
    Lecture,
    Terminated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(String),
    Load(PathBuf),
    Enrol(String),
    Remove(String),
    Give { delta: PointDelta, name: String },
    Calc,
    Print,
    Export,
    Close,
    Exit,
}

/// Outcome of one successfully interpreted command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Effect {
    Opened { lecture: String, students: usize },
    Enrolled { name: String },
    Removed { name: String },
    PointsChanged { name: String, points: u8 },
    /// `students == 0` means the roster was empty and nothing was graded.
    Graded { average: f64, students: usize },
    Printed(LectureView),
    Exported { path: String, students: usize },
    Closed { lecture: String },
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Create,
    Load,
    Enrol,
    Remove,
    Give,
    Calc,
    Print,
    Export,
    Close,
    Exit,
}

impl Verb {
    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "create" => Verb::Create,
            "load" => Verb::Load,
            "enrol" => Verb::Enrol,
            "remove" => Verb::Remove,
            "give" => Verb::Give,
            "calc" => Verb::Calc,
            "print" => Verb::Print,
            "export" => Verb::Export,
            "close" => Verb::Close,
            "exit" => Verb::Exit,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Verb::Create | Verb::Load | Verb::Enrol | Verb::Remove => 1,
            Verb::Give => 2,
            Verb::Calc | Verb::Print | Verb::Export | Verb::Close | Verb::Exit => 0,
        }
    }

    fn allowed_in(self, mode: Mode) -> bool {
        match self {
            Verb::Exit => true,
            Verb::Create | Verb::Load => mode == Mode::Global,
            _ => mode == Mode::Lecture,
        }
    }
}

pub fn tokenize(line: &str) -> Vec<&str> {
    line.split([' ', '\t', '\x0b'])
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn parse_command(line: &str, mode: Mode) -> Result<Command, RosterError> {
    let tokens = tokenize(line);
    let Some((&head, args)) = tokens.split_first() else {
        return Err(RosterError::UnknownCommand(String::new()));
    };
    let Some(verb) = Verb::from_token(head) else {
        return Err(RosterError::UnknownCommand(head.to_string()));
    };
    if verb == Verb::Exit && !args.is_empty() {
        return Err(RosterError::InvalidArgument(
            "exit takes no arguments".to_string(),
        ));
    }
    if !verb.allowed_in(mode) {
        return Err(RosterError::InvalidArgument(format!(
            "{head} cannot be used in the current mode"
        )));
    }
    if args.len() != verb.arity() {
        return Err(RosterError::InvalidArgument(format!(
            "{head} expects {} argument(s), got {}",
            verb.arity(),
            args.len()
        )));
    }

    Ok(match verb {
        Verb::Create => Command::Create(args[0].to_string()),
        Verb::Load => Command::Load(PathBuf::from(args[0])),
        Verb::Enrol => Command::Enrol(args[0].to_string()),
        Verb::Remove => Command::Remove(args[0].to_string()),
        Verb::Give => Command::Give {
            delta: parse_points(args[0])?,
            name: args[1].to_string(),
        },
        Verb::Calc => Command::Calc,
        Verb::Print => Command::Print,
        Verb::Export => Command::Export,
        Verb::Close => Command::Close,
        Verb::Exit => Command::Exit,
    })
}

/// Interpreter state. Only `Active` owns a lecture.
#[derive(Debug, Default)]
pub enum Session {
    #[default]
    Global,
    Active(Lecture),
    Terminated,
}

impl Session {
    pub fn mode(&self) -> Mode {
        match self {
            Session::Global => Mode::Global,
            Session::Active(_) => Mode::Lecture,
            Session::Terminated => Mode::Terminated,
        }
    }

    pub fn lecture(&self) -> Option<&Lecture> {
        match self {
            Session::Active(lecture) => Some(lecture),
            _ => None,
        }
    }

    /// Parse and run one input line against the current mode.
    pub fn execute(self, line: &str, reports_dir: &Path) -> (Session, Result<Effect, RosterError>) {
        match parse_command(line, self.mode()) {
            Ok(command) => {
                log::debug!("dispatch {:?} in {:?} mode", command, self.mode());
                self.step(command, reports_dir)
            }
            Err(e) => (self, Err(e)),
        }
    }

    /// Apply one command. On error the returned session is the one passed in,
    /// untouched.
    pub fn step(
        self,
        command: Command,
        reports_dir: &Path,
    ) -> (Session, Result<Effect, RosterError>) {
        match (self, command) {
            (Session::Terminated, _) => (
                Session::Terminated,
                Err(RosterError::InvalidArgument(
                    "session already terminated".to_string(),
                )),
            ),
            (_, Command::Exit) => {
                log::info!("session terminated by exit");
                (Session::Terminated, Ok(Effect::Exited))
            }
            (Session::Global, Command::Create(name)) => match Lecture::create(&name) {
                Ok(lecture) => open(lecture),
                Err(e) => (Session::Global, Err(e)),
            },
            (Session::Global, Command::Load(path)) => match record::load_lecture(&path) {
                Ok(lecture) => open(lecture),
                Err(e) => (Session::Global, Err(e)),
            },
            (Session::Active(lecture), command) => step_lecture(lecture, command, reports_dir),
            (session, command) => (
                session,
                Err(RosterError::InvalidArgument(format!(
                    "{command:?} cannot be used in the current mode"
                ))),
            ),
        }
    }
}

fn open(lecture: Lecture) -> (Session, Result<Effect, RosterError>) {
    log::info!(
        "lecture {} opened with {} student(s)",
        lecture.name(),
        lecture.len()
    );
    let effect = Effect::Opened {
        lecture: lecture.name().to_string(),
        students: lecture.len(),
    };
    (Session::Active(lecture), Ok(effect))
}

fn step_lecture(
    mut lecture: Lecture,
    command: Command,
    reports_dir: &Path,
) -> (Session, Result<Effect, RosterError>) {
    let result = match command {
        Command::Enrol(name) => lecture.enrol(&name).map(|_| Effect::Enrolled { name }),
        Command::Remove(name) => lecture.remove(&name).map(|s| Effect::Removed { name: s.name }),
        Command::Give { delta, name } => lecture
            .give_or_deduct(&name, delta)
            .map(|points| Effect::PointsChanged { name, points }),
        Command::Calc => Ok(match grading::calc(&mut lecture) {
            Some(curve) => {
                log::debug!(
                    "graded {} student(s) against max {} points",
                    curve.grades.len(),
                    curve.max_points
                );
                Effect::Graded {
                    average: curve.average_grade,
                    students: curve.grades.len(),
                }
            }
            None => Effect::Graded {
                average: 0.0,
                students: 0,
            },
        }),
        Command::Print => Ok(Effect::Printed(lecture.view())),
        Command::Export => record::export_lecture(&lecture, reports_dir).map(|path| {
            Effect::Exported {
                path: path.to_string_lossy().to_string(),
                students: lecture.len(),
            }
        }),
        Command::Close => {
            log::info!("lecture {} closed", lecture.name());
            let name = lecture.name().to_string();
            return (Session::Global, Ok(Effect::Closed { lecture: name }));
        }
        other => Err(RosterError::InvalidArgument(format!(
            "{other:?} cannot be used in the current mode"
        ))),
    };
    (Session::Active(lecture), result)
}
