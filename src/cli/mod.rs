//! Line-oriented demo REPL standing in for the UI layer. Every command maps
//! onto one of the core operations, so the gate/session/onboarding contract
//! can be exercised end to end from a terminal.

use std::sync::Arc;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::auth::SignupForm;
use crate::context::MallContext;
use crate::error::MallError;
use crate::geo::{FixedGeolocator, GeoPoint};
use crate::onboarding::ConsentForm;

const HELP: &str = "commands:
  signup <email> <password> <username>   create an account (pin a location first)
  login <email> <password>               sign in
  logout                                 sign out
  pin <lat> <lng>                        pin a location (pre-signup or profile update)
  require <label>                        run a gated action; suspends until login or cancel
  cancel                                 dismiss the auth surface (resolves gated actions with none)
  consent <name> <contact> <gov-id>      submit guardian consent (--absent to leave supervision unconfirmed)
  consent-cancel                         dismiss the consent form
  score <points>                         bump activity score
  follow <uid>                           follow another user
  report <uid>                           report another user's profile
  profile                                show the stored profile document
  status                                 session / gate / onboarding snapshot
  quit";

fn render_err(e: &MallError) {
    println!("error [{}]: {}", e.code_str(), e.message());
}

pub async fn run(ctx: Arc<MallContext>, default_pin: GeoPoint) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    // The most recent pin; used as the signup location while signed out.
    let mut pinned: Option<GeoPoint> = None;
    println!("CloudMall interaction core demo. Type 'help' for commands.");

    loop {
        let line = match editor.readline("mall> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&line);
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            ["help"] => println!("{HELP}"),
            ["quit"] | ["exit"] => break,

            ["signup", email, password, username] => {
                let form = SignupForm {
                    email: (*email).to_string(),
                    password: (*password).to_string(),
                    username: (*username).to_string(),
                    location: pinned.or(Some(default_pin)),
                    avatar_id: None,
                };
                match ctx.auth.sign_up(form).await {
                    Ok(id) => println!("signed up as {} ({})", id.email, id.uid),
                    Err(e) => render_err(&e),
                }
            }
            ["login", email, password] => match ctx.auth.sign_in(email, password).await {
                Ok(id) => println!("signed in as {}", id.email),
                Err(e) => render_err(&e),
            },
            ["logout"] => match ctx.auth.sign_out().await {
                Ok(()) => println!("signed out"),
                Err(e) => render_err(&e),
            },

            ["pin", lat, lng] => {
                let (Ok(lat), Ok(lng)) = (lat.parse::<f64>(), lng.parse::<f64>()) else {
                    println!("pin expects two numbers");
                    continue;
                };
                let point = GeoPoint::new(lat, lng);
                if ctx.session.current().is_some() {
                    match ctx.pin_location(&FixedGeolocator(point)).await {
                        Ok(p) => println!("location saved, area {}", p.area_id()),
                        Err(e) => render_err(&e),
                    }
                } else {
                    pinned = Some(point);
                    println!("pinned {} for signup", point.area_id());
                }
            }

            ["require", label] => {
                let label = (*label).to_string();
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    match ctx.gate.require_identity().await {
                        Some(id) => println!("[{}] proceeding as {}", label, id.email),
                        None => println!("[{}] aborted: no identity", label),
                    }
                });
            }
            ["cancel"] => ctx.gate.dismiss(),

            ["consent", rest @ ..] => {
                let absent = rest.contains(&"--absent");
                let fields: Vec<&&str> = rest.iter().filter(|p| !p.starts_with("--")).collect();
                let form = ConsentForm {
                    parent_name: fields.first().map(|s| s.to_string()).unwrap_or_default(),
                    parent_contact: fields.get(1).map(|s| s.to_string()).unwrap_or_default(),
                    parent_nearby: !absent,
                    government_id: fields.get(2).map(|s| s.to_string()).unwrap_or_default(),
                };
                match ctx.onboarding.submit_consent(form).await {
                    Ok(()) => println!("onboarding complete"),
                    Err(e) => render_err(&e),
                }
            }
            ["consent-cancel"] => ctx.onboarding.cancel(),

            ["score", points] => match points.parse::<u64>() {
                Ok(points) => match ctx.bump_activity(points).await {
                    Ok(()) => println!("activity +{points}"),
                    Err(e) => render_err(&e),
                },
                Err(_) => println!("score expects a number"),
            },

            ["follow", uid] => match ctx.follow(uid).await {
                Ok(()) => println!("now following {uid}"),
                Err(e) => render_err(&e),
            },
            ["report", uid] => match ctx.report(uid).await {
                Ok(()) => println!("report filed against {uid}"),
                Err(e) => render_err(&e),
            },

            ["profile"] => {
                let Some(id) = ctx.session.current() else {
                    println!("signed out");
                    continue;
                };
                match ctx.profiles().read(&id.uid).await {
                    Ok(Some(profile)) => {
                        println!("{}", serde_json::to_string_pretty(&profile)?);
                    }
                    Ok(None) => println!("no profile document"),
                    Err(e) => render_err(&e),
                }
            }

            ["status"] => {
                match ctx.session.current() {
                    Some(id) => println!("session: signed in as {}", id.email),
                    None => println!("session: signed out"),
                }
                println!(
                    "gate: surface {} pending {}",
                    if ctx.gate.surface_visible() { "open" } else { "closed" },
                    ctx.gate.pending_count()
                );
                println!(
                    "onboarding: {:?}, form {}",
                    ctx.onboarding.status(),
                    if ctx.onboarding.form_visible() { "open" } else { "closed" }
                );
            }

            _ => println!("unknown command; type 'help'"),
        }
    }
    Ok(())
}
