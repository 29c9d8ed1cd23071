//! Run one member action from the command line and print the response
//!
//! ```text
//! member-admin --id 3 --action doUnlock --ajax
//! member-admin --id 3 --link "CustomLink=doExport"
//! member-admin --save-and-close --payload '{"Email": "ada@example.com"}'
//! ```

mod member;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use record_actions::prelude::*;
use record_actions::{AuditConfig, AuditFilter, AuditMiddleware, FixedGrid, SecurityToken};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use member::Member;

#[derive(Parser, Debug)]
#[command(name = "member-admin")]
#[command(about = "Dispatch a member action and print the HTTP response")]
struct Args {
    /// Member id; omit to act on an unsaved member
    #[arg(long)]
    id: Option<RecordId>,

    /// Member email
    #[arg(long, default_value = "ada@example.com")]
    email: String,

    /// Start with the member locked
    #[arg(long, default_value_t = false)]
    locked: bool,

    /// Action to submit from the edit form
    #[arg(short, long, conflicts_with_all = ["link", "save_and_close"])]
    action: Option<String>,

    /// Query string of a custom link, e.g. "CustomLink=doExport"
    #[arg(long, conflicts_with = "save_and_close")]
    link: Option<String>,

    /// Save the member and return to the list
    #[arg(long, default_value_t = false)]
    save_and_close: bool,

    /// Submitted form data as a JSON object
    #[arg(short, long, default_value = "{}")]
    payload: String,

    /// Send the request as an async (XMLHttpRequest) request
    #[arg(long, default_value_t = false)]
    ajax: bool,

    /// Ids visible in the member list
    #[arg(long, value_delimiter = ',')]
    listed: Vec<RecordId>,

    /// Expected security token; enables the token check
    #[arg(long)]
    token: Option<String>,

    /// Dispatcher configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every dispatch
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let config = match &args.config {
        Some(path) => DispatcherConfig::from_json(&fs::read_to_string(path)?)?,
        None => DispatcherConfig::default(),
    };

    let middleware = ComposedMiddleware::new()
        .with(if args.verbose {
            LoggingMiddleware::verbose()
        } else {
            LoggingMiddleware::new()
        })
        .with(AuditMiddleware::new(AuditConfig::new(
            20,
            AuditFilter::default(),
        )));

    let mut dispatcher = ActionDispatcher::new(Member::registry())
        .with_config(config)
        .with_middleware(middleware);
    if let Some(token) = &args.token {
        let field = dispatcher.config().token_field.clone();
        dispatcher = dispatcher.with_token_validator(SecurityToken::new(field, token.clone()));
    }

    let payload: Payload = serde_json::from_str(&args.payload)?;
    let request = match (&args.action, &args.link) {
        (Some(action), _) => DispatchRequest::new(action.clone(), payload, args.ajax),
        (None, Some(query)) => dispatcher.link_request(query, args.ajax)?,
        (None, None) if args.save_and_close => DispatchRequest::save_and_close(payload, args.ajax),
        (None, None) => dispatcher.form_request(payload, args.ajax)?,
    };

    let mut member = Member::new(args.id, args.email.clone(), args.locked);
    let listed = if args.listed.is_empty() {
        args.id.into_iter().collect()
    } else {
        args.listed.clone()
    };
    let grid = FixedGrid::new("admin/members", listed);
    let url = grid.item_url(member.id(), request.route.segment());
    let ctx = RequestContext::new(url, &grid).ajax(args.ajax);

    let declared = dispatcher.item_form_actions(ActionList::new(), &member);
    tracing::debug!(actions = ?declared.names(), "Form actions");

    let form = FormContext::new("ItemEditForm");
    let mut session = MemorySession::new();
    let has_form = request.route != Route::CustomLink;
    let response = dispatcher.handle(
        &mut member,
        request,
        has_form.then_some(&form),
        &ctx,
        &mut session,
    );

    print_response(&response);
    if let Some(flash) = session.take_flash(&form.name) {
        println!("flash ({}): {}", flash.kind.as_str(), flash.message);
    }
    println!("member: {}", serde_json::to_string(&member)?);
    Ok(())
}

fn print_response(response: &http::Response<String>) {
    println!("{:?} {}", response.version(), response.status());
    for (name, value) in response.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    if !response.body().is_empty() {
        println!();
        println!("{}", response.body());
    }
}
