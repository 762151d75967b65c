use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::error::{err, ok, RosterError};
use crate::roster::{GradeStatus, LectureView};
use crate::session::{Effect, Mode, Session};

const RULE: &str = "+===========================+";
const SEPARATOR: &str = "+---------------------------+";

/// Read one line of any length. `None` signals end of input. The trailing
/// `\n` (and a `\r` before it) is stripped.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf: Vec<u8> = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

pub trait Console {
    fn welcome(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn prompt(&mut self, _session: &Session) -> io::Result<()> {
        Ok(())
    }

    /// Render the outcome of input line `seq` (1-based).
    fn report(
        &mut self,
        seq: usize,
        before: Mode,
        session: &Session,
        outcome: &Result<Effect, RosterError>,
    ) -> io::Result<()>;

    fn farewell(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct TextConsole<W: Write> {
    out: W,
    quiet: bool,
}

impl<W: Write> TextConsole<W> {
    pub fn new(out: W, quiet: bool) -> Self {
        Self { out, quiet }
    }

    fn mode_help(&mut self, mode: Mode) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let commands: &[(&str, &str)] = match mode {
            Mode::Global => &[
                ("create", "create new lecture"),
                ("load", "load existing lecture"),
            ],
            Mode::Lecture => &[
                ("enrol", "enrol new student to the lecture"),
                ("remove", "remove a student from the lecture"),
                ("give", "give points to a student"),
                ("calc", "calculate the grades for every student"),
                ("print", "print the lecture"),
                ("export", "export the lecture to a file"),
                ("close", "close the lecture"),
            ],
            Mode::Terminated => return Ok(()),
        };
        writeln!(self.out)?;
        writeln!(self.out, "Please enter one of the following commands:")?;
        for (name, about) in commands {
            writeln!(self.out, "  {name:<6} - {about}")?;
        }
        Ok(())
    }
}

pub fn render_view<W: Write>(out: &mut W, view: &LectureView) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "Lecture: {}", view.name)?;
    writeln!(out, "Number of students: {}", view.student_count)?;
    if let (GradeStatus::Current, Some(avg)) = (view.shape, view.average_grade) {
        writeln!(out, "Average Grade: {avg:.2}")?;
    }
    writeln!(out, "{RULE}")?;
    for s in &view.students {
        writeln!(out, "Name: {}", s.name)?;
        writeln!(out, "Points: {}", s.points)?;
        if let Some(grade) = s.grade {
            writeln!(out, "Grade: {grade}")?;
        }
        writeln!(out, "{SEPARATOR}")?;
    }
    Ok(())
}

impl<W: Write> Console for TextConsole<W> {
    fn welcome(&mut self) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "|  Lecture Roster & Grading |")?;
        writeln!(self.out, "{RULE}")?;
        self.mode_help(Mode::Global)
    }

    fn prompt(&mut self, session: &Session) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        match session.lecture() {
            Some(lecture) => write!(self.out, "[{}] > ", lecture.name())?,
            None => write!(self.out, "[] > ")?,
        }
        self.out.flush()
    }

    fn report(
        &mut self,
        _seq: usize,
        before: Mode,
        session: &Session,
        outcome: &Result<Effect, RosterError>,
    ) -> io::Result<()> {
        match outcome {
            Err(e) => writeln!(self.out, "Error: {e}")?,
            Ok(Effect::Printed(view)) => render_view(&mut self.out, view)?,
            Ok(_) => {}
        }
        if session.mode() != before {
            self.mode_help(session.mode())?;
        }
        self.out.flush()
    }

    fn farewell(&mut self) -> io::Result<()> {
        if !self.quiet {
            writeln!(self.out, "Goodbye!")?;
        }
        self.out.flush()
    }
}

/// One JSON object per input line, using the `ok`/`err` envelope.
pub struct JsonConsole<W: Write> {
    out: W,
}

impl<W: Write> JsonConsole<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Console for JsonConsole<W> {
    fn report(
        &mut self,
        seq: usize,
        _before: Mode,
        session: &Session,
        outcome: &Result<Effect, RosterError>,
    ) -> io::Result<()> {
        let id = seq.to_string();
        let resp = match outcome {
            Ok(effect) => ok(
                &id,
                json!({
                    "mode": session.mode(),
                    "effect": serde_json::to_value(effect).unwrap_or(serde_json::Value::Null),
                }),
            ),
            Err(e) => err(
                &id,
                e.code(),
                e.to_string(),
                Some(json!({ "mode": session.mode(), "fatal": e.is_fatal() })),
            ),
        };
        writeln!(self.out, "{}", resp)?;
        self.out.flush()
    }
}
