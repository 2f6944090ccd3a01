//! Maps bot commands to replies.

use std::{convert::TryFrom, fmt};
use tracing::{error, info};

use crate::{
    error::CommandParseError,
    model::LocationQuery,
    pipeline::{Resolution, WeatherPipeline},
    transform::{render_not_found, render_report},
};

pub const START_REPLY: &str = "Hi! I am a weather bot.\n\
     Send /weather followed by a place name, e.g. /weather Riccione, \
     and I will tell you the current conditions there.";

pub const MISSING_LOCATION_REPLY: &str = "you did not specify a location";

pub const NOT_IMPLEMENTED_REPLY: &str = "Not implemented";

pub const FAILURE_REPLY: &str =
    "Sorry, I could not fetch the weather right now. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Weather,
    NextHour,
    Tomorrow,
    Week,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Weather => "weather",
            Command::NextHour => "nexthour",
            Command::Tomorrow => "tomorrow",
            Command::Week => "week",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "show the welcome message",
            Command::Help => "list available commands",
            Command::Weather => "current weather for a place",
            Command::NextHour => "forecast for the next hour",
            Command::Tomorrow => "forecast for tomorrow",
            Command::Week => "forecast for the week",
        }
    }

    pub const fn all() -> &'static [Command] {
        &[
            Command::Start,
            Command::Help,
            Command::Weather,
            Command::NextHour,
            Command::Tomorrow,
            Command::Week,
        ]
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Command {
    type Error = CommandParseError;

    /// Accepts `weather`, `/weather` and `/weather@SomeBot`, in any case.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let name = value.strip_prefix('/').unwrap_or(value);
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);
        let lower = name.to_lowercase();

        Command::all()
            .iter()
            .copied()
            .find(|cmd| cmd.as_str() == lower)
            .ok_or_else(|| CommandParseError::Unknown(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: Command,
    /// Everything after the command token, untrimmed.
    pub args: String,
    pub chat_id: i64,
}

impl CommandRequest {
    pub fn new(command: Command, args: impl Into<String>, chat_id: i64) -> Self {
        Self { command, args: args.into(), chat_id }
    }

    /// Split `text` into a command token and the remainder. A `@botname`
    /// suffix on the command is accepted whatever the name.
    pub fn parse(text: &str, chat_id: i64) -> Result<Self, CommandParseError> {
        Self::parse_addressed(text, chat_id, None)
    }

    /// Like [`CommandRequest::parse`], but a `@botname` suffix must name `bot_username`.
    pub fn parse_for_bot(
        text: &str,
        chat_id: i64,
        bot_username: &str,
    ) -> Result<Self, CommandParseError> {
        Self::parse_addressed(text, chat_id, Some(bot_username))
    }

    fn parse_addressed(
        text: &str,
        chat_id: i64,
        bot_username: Option<&str>,
    ) -> Result<Self, CommandParseError> {
        let text = text.trim_start();
        if !text.starts_with('/') {
            return Err(CommandParseError::NotACommand);
        }

        let (token, rest) = match text.find(char::is_whitespace) {
            Some(idx) => text.split_at(idx),
            None => (text, ""),
        };

        let foreign = token
            .split_once('@')
            .map(|(_, addressee)| addressee)
            .filter(|addressee| bot_username.is_some_and(|me| !addressee.eq_ignore_ascii_case(me)));
        if let Some(addressee) = foreign {
            return Err(CommandParseError::OtherBot(addressee.to_string()));
        }

        Ok(Self::new(Command::try_from(token)?, rest, chat_id))
    }
}

pub fn help_text() -> String {
    let mut text = String::from("Available commands:");
    for cmd in Command::all() {
        let usage = match cmd {
            // replies are sent as HTML
            Command::Weather => "/weather &lt;location&gt;".to_string(),
            other => format!("/{other}"),
        };
        text.push_str(&format!("\n{usage} - {}", cmd.description()));
    }
    text
}

#[derive(Debug)]
pub struct Router {
    pipeline: WeatherPipeline,
}

impl Router {
    pub fn new(pipeline: WeatherPipeline) -> Self {
        Self { pipeline }
    }

    /// Produce the reply for one command. Never fails: upstream errors are
    /// logged and answered with [`FAILURE_REPLY`].
    pub async fn handle(&self, request: &CommandRequest) -> String {
        info!(chat_id = request.chat_id, command = %request.command, "received command");

        match request.command {
            Command::Start => START_REPLY.to_string(),
            Command::Help => help_text(),
            Command::Weather => self.weather(&request.args, request.chat_id).await,
            Command::NextHour | Command::Tomorrow | Command::Week => {
                NOT_IMPLEMENTED_REPLY.to_string()
            }
        }
    }

    async fn weather(&self, args: &str, chat_id: i64) -> String {
        let Some(query) = LocationQuery::parse(args) else {
            return MISSING_LOCATION_REPLY.to_string();
        };

        match self.pipeline.resolve(&query).await {
            Ok(Resolution::Report(report)) => render_report(&report),
            Ok(Resolution::NotFound(query)) => render_not_found(&query),
            Err(err) => {
                error!(chat_id, query = %query, upstream = %err.upstream(), error = %err, "weather lookup failed");
                FAILURE_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::Coordinates,
        testing::{CallCounter, FakeGeocoder, FakeWeather, riccione_payload},
        transform::CompassPolicy,
    };

    struct Harness {
        router: Router,
        geocode_calls: CallCounter,
        weather_calls: CallCounter,
    }

    fn harness(geocoder: FakeGeocoder, weather: FakeWeather) -> Harness {
        let geocode_calls = geocoder.calls();
        let weather_calls = weather.calls();
        let pipeline =
            WeatherPipeline::new(Box::new(geocoder), Box::new(weather), CompassPolicy::Sixteen);

        Harness { router: Router::new(pipeline), geocode_calls, weather_calls }
    }

    fn riccione() -> Harness {
        harness(
            FakeGeocoder::found(Coordinates::new(44.0, 12.65).unwrap()),
            FakeWeather::returning(riccione_payload()),
        )
    }

    #[test]
    fn command_names_roundtrip() {
        for cmd in Command::all() {
            let parsed = Command::try_from(cmd.as_str()).expect("roundtrip should succeed");
            assert_eq!(*cmd, parsed);
        }
    }

    #[test]
    fn command_accepts_slash_bot_suffix_and_case() {
        assert_eq!(Command::try_from("/Weather@MyWeatherBot"), Ok(Command::Weather));
        assert_eq!(Command::try_from("/NEXTHOUR"), Ok(Command::NextHour));
    }

    #[test]
    fn unknown_command_error() {
        let err = Command::try_from("/forecast").unwrap_err();
        assert_eq!(err, CommandParseError::Unknown("forecast".into()));
    }

    #[test]
    fn parse_keeps_multi_word_location() {
        let req = CommandRequest::parse("/weather New   York City", 7).unwrap();
        assert_eq!(req.command, Command::Weather);
        assert_eq!(req.args.trim(), "New   York City");
        assert_eq!(req.chat_id, 7);
    }

    #[test]
    fn parse_without_argument() {
        let req = CommandRequest::parse("/weather", 1).unwrap();
        assert_eq!(req.args, "");
    }

    #[test]
    fn parse_for_bot_checks_addressee() {
        let req = CommandRequest::parse_for_bot("/weather@WeatherBot Rome", 1, "weatherbot").unwrap();
        assert_eq!(req.command, Command::Weather);
        assert_eq!(req.args.trim(), "Rome");

        let req = CommandRequest::parse_for_bot("/help", 1, "WeatherBot").unwrap();
        assert_eq!(req.command, Command::Help);

        assert_eq!(
            CommandRequest::parse_for_bot("/weather@OtherBot Rome", 1, "WeatherBot"),
            Err(CommandParseError::OtherBot("OtherBot".into()))
        );
    }

    #[test]
    fn fixed_replies_are_valid_telegram_html() {
        use crate::transform::escape_html;

        for reply in [START_REPLY, MISSING_LOCATION_REPLY, NOT_IMPLEMENTED_REPLY, FAILURE_REPLY] {
            assert_eq!(escape_html(reply), reply);
        }

        let help = help_text();
        assert!(!help.contains('<'));
        assert!(!help.contains('>'));
        assert!(help.contains("/weather &lt;location&gt;"));
    }

    #[test]
    fn parse_rejects_plain_text() {
        assert_eq!(CommandRequest::parse("hello there", 1), Err(CommandParseError::NotACommand));
    }

    #[tokio::test]
    async fn missing_location_makes_no_network_calls() {
        let h = riccione();

        for args in ["", " ", "   \t ", "\n"] {
            let reply = h.router.handle(&CommandRequest::new(Command::Weather, args, 1)).await;
            assert_eq!(reply, MISSING_LOCATION_REPLY);
        }

        assert_eq!(h.geocode_calls.count(), 0);
        assert_eq!(h.weather_calls.count(), 0);
    }

    #[tokio::test]
    async fn start_and_help_are_fixed_and_offline() {
        let h = riccione();

        for chat_id in [1, -100, 42] {
            let start = h.router.handle(&CommandRequest::new(Command::Start, "", chat_id)).await;
            let help = h.router.handle(&CommandRequest::new(Command::Help, "x", chat_id)).await;
            assert_eq!(start, START_REPLY);
            assert_eq!(help, help_text());
        }

        assert!(help_text().contains("/weather &lt;location&gt;"));
        assert_eq!(h.geocode_calls.count(), 0);
        assert_eq!(h.weather_calls.count(), 0);
    }

    #[tokio::test]
    async fn forecast_commands_are_not_implemented() {
        let h = riccione();

        for cmd in [Command::NextHour, Command::Tomorrow, Command::Week] {
            let reply = h.router.handle(&CommandRequest::new(cmd, " Riccione", 1)).await;
            assert_eq!(reply, NOT_IMPLEMENTED_REPLY);
        }

        assert_eq!(h.geocode_calls.count(), 0);
        assert_eq!(h.weather_calls.count(), 0);
    }

    #[tokio::test]
    async fn unknown_location_gets_not_found_reply() {
        let h = harness(FakeGeocoder::not_found(), FakeWeather::returning(riccione_payload()));

        let reply = h.router.handle(&CommandRequest::parse("/weather Atlantis", 1).unwrap()).await;

        assert_eq!(reply, "I'm sorry but \"Atlantis\" does not exist. Try again.");
        assert_eq!(h.geocode_calls.count(), 1);
        assert_eq!(h.weather_calls.count(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_gets_generic_reply() {
        let h = harness(
            FakeGeocoder::found(Coordinates::new(1.0, 2.0).unwrap()),
            FakeWeather::failing("missing `current`"),
        );

        let reply = h.router.handle(&CommandRequest::parse("/weather Riccione", 1).unwrap()).await;
        assert_eq!(reply, FAILURE_REPLY);

        let h = harness(FakeGeocoder::failing("timeout"), FakeWeather::returning(riccione_payload()));
        let reply = h.router.handle(&CommandRequest::parse("/weather Riccione", 1).unwrap()).await;
        assert_eq!(reply, FAILURE_REPLY);
        assert_eq!(h.weather_calls.count(), 0);
    }

    #[tokio::test]
    async fn weather_riccione_end_to_end() {
        let h = riccione();

        let reply = h.router.handle(&CommandRequest::parse("/weather Riccione", 99).unwrap()).await;

        assert!(reply.contains("Riccione"));
        assert!(reply.contains("26.85°C"));
        assert!(reply.contains("25.85°C"));
        assert!(reply.contains("1012 hPa"));
        assert!(reply.contains("60%"));
        assert!(reply.contains("3.0 m/s (5.83 kn)"));
        assert!(reply.contains("from N\n"));
        assert!(reply.contains("clear sky"));
        assert_eq!(h.geocode_calls.count(), 1);
        assert_eq!(h.weather_calls.count(), 1);
    }
}
