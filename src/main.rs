use clap::Parser;
use mailconfirm::application::spawn;
use mailconfirm::config::{DEFAULT_LINK_BASE, ServiceConfig, SmtpConfig};
use mailconfirm::domain::ports::MailerBox;
use mailconfirm::infrastructure::log_mailer::LogMailer;
use mailconfirm::interfaces::email::EmailTemplate;
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to run the confirmation flow for
    address: String,

    /// Seconds between batch dispatch cycles
    #[arg(long, default_value_t = 10)]
    dispatch_interval: u64,

    /// Seconds after a delivery attempt before a new request is honored
    #[arg(long, default_value_t = 30)]
    resend_window: u64,

    /// Upper bound in seconds on one batch delivery (0 waits indefinitely)
    #[arg(long, default_value_t = 60)]
    delivery_timeout: u64,

    /// Prefix the token is appended to in the confirmation link
    #[arg(long, default_value = DEFAULT_LINK_BASE)]
    link_base: String,

    /// Sender mailbox of the confirmation email
    #[arg(long, default_value = "No-Reply <no-reply@example.com>")]
    from: String,

    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    smtp_host: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    #[arg(long, env = "SMTP_USER", default_value = "")]
    smtp_user: String,

    #[arg(long, env = "SMTP_PASS", default_value = "", hide_env_values = true)]
    smtp_password: String,

    /// How many status checks to print before asking for the token
    #[arg(long, default_value_t = 7)]
    polls: u32,

    /// Seconds between status checks
    #[arg(long, default_value_t = 5)]
    poll_every: u64,
}

impl Cli {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            dispatch_interval: Duration::from_secs(self.dispatch_interval),
            resend_window: Duration::from_secs(self.resend_window),
            delivery_timeout: (self.delivery_timeout > 0)
                .then(|| Duration::from_secs(self.delivery_timeout)),
        }
    }

    fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
        }
    }

    fn template(&self) -> EmailTemplate {
        EmailTemplate {
            link_base: self.link_base.clone(),
            from: self.from.clone(),
            ..Default::default()
        }
    }
}

#[cfg(feature = "smtp")]
fn build_mailer(smtp: SmtpConfig, template: EmailTemplate) -> mailconfirm::error::Result<MailerBox> {
    use mailconfirm::infrastructure::smtp::SmtpMailer;

    if smtp.has_credentials() {
        tracing::info!(host = %smtp.host, port = smtp.port, "delivering through SMTP relay");
        Ok(Box::new(SmtpMailer::new(smtp, template)?))
    } else {
        tracing::info!("no SMTP credentials given, confirmation links will only be logged");
        Ok(Box::new(LogMailer::new(template)))
    }
}

#[cfg(not(feature = "smtp"))]
fn build_mailer(smtp: SmtpConfig, template: EmailTemplate) -> mailconfirm::error::Result<MailerBox> {
    if smtp.has_credentials() {
        tracing::warn!(
            "WARNING: SMTP delivery requested via --smtp-user/--smtp-password, but 'smtp' feature is not enabled. Falling back to log-only delivery."
        );
    }
    Ok(Box::new(LogMailer::new(template)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mailer = build_mailer(cli.smtp_config(), cli.template()).into_diagnostic()?;
    let (producer, actor) = spawn(cli.service_config(), mailer).into_diagnostic()?;

    // Step 1: ask for a confirmation email
    let accepted = producer
        .request_confirmation(&cli.address)
        .await
        .into_diagnostic()?;
    println!("request accepted: {accepted}");

    for _ in 0..cli.polls {
        let status = producer.check_status(&cli.address).await.into_diagnostic()?;
        println!("status: {}", serde_json::to_string(&status).into_diagnostic()?);
        tokio::time::sleep(Duration::from_secs(cli.poll_every)).await;
    }

    // Step 2: the link's token would normally arrive through an HTTP endpoint
    print!("token from the link: ");
    std::io::stdout().flush().into_diagnostic()?;
    let mut token = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut token)
        .await
        .into_diagnostic()?;

    let confirmed = producer
        .confirm_token(token.trim())
        .await
        .into_diagnostic()?;
    println!("confirmed: {confirmed}");

    let status = producer.check_status(&cli.address).await.into_diagnostic()?;
    println!(
        "after confirmation: {}",
        serde_json::to_string(&status).into_diagnostic()?
    );

    drop(producer);
    actor.await.into_diagnostic()?;

    Ok(())
}
