//! Busflow command line demo.
//!
//! Without arguments, books two seats Lima → Arequipa for tomorrow, prints a
//! share link for the booking and then pays it directly.
//!
//! With a share link (or just its query string) as the first argument, opens
//! the shared booking and pays it before the countdown runs out.

use anyhow::{Context, bail};
use busflow_booking::{
    BookingEnvironment, BookingPhase, CityCode, Confirmation, Config, ContactInfo, DocumentType,
    Money, Notice, PassengerForm, SearchCriteria, Session, catalog, metrics::register_booking_metrics,
};
use busflow_core::environment::{Clock, SystemClock};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    register_booking_metrics();
    info!(
        share_base_url = %config.share.base_url,
        notifier = config.notifier.endpoint.as_deref().unwrap_or("log"),
        "Configuration loaded"
    );

    let env = BookingEnvironment::from_config(&config).context("building environment")?;

    let session = match std::env::args().nth(1) {
        Some(link) => pay_shared(env, &link).await?,
        None => book_and_pay(env).await?,
    };

    session.shutdown(SHUTDOWN_TIMEOUT).await?;
    info!("Done");
    Ok(())
}

fn demo_contact() -> ContactInfo {
    ContactInfo {
        full_name: "Ana Quispe".into(),
        email: "ana.quispe@example.com".into(),
        phone: "+51 999 111 222".into(),
        document_number: "44556677".into(),
        birth_date: "1990-05-01".into(),
    }
}

fn demo_passengers() -> [PassengerForm; 2] {
    [
        PassengerForm {
            document_type: DocumentType::NationalId,
            document_number: "44556677".into(),
            first_name: "Ana".into(),
            last_name: "Quispe".into(),
            email: "ana.quispe@example.com".into(),
            phone: "+51 999 111 222".into(),
        },
        PassengerForm {
            document_type: DocumentType::Passport,
            document_number: "X1234567".into(),
            first_name: "Luis".into(),
            last_name: "Mamani".into(),
            ..PassengerForm::default()
        },
    ]
}

async fn book_and_pay(env: BookingEnvironment) -> anyhow::Result<Session> {
    let tomorrow = SystemClock
        .now()
        .date_naive()
        .succ_opt()
        .context("no tomorrow")?;
    let criteria = SearchCriteria {
        origin: CityCode::new("lima"),
        destination: CityCode::new("arequipa"),
        date: tomorrow,
        passenger_count: 2,
    };

    let session = Session::new(env);

    println!(
        "Searching {} → {} on {}...",
        catalog::display_name(&criteria.origin),
        catalog::display_name(&criteria.destination),
        criteria.date.format("%d/%m/%Y"),
    );
    let departures = session.search(criteria).await?;
    for departure in &departures {
        println!(
            "  {}  {:<11} {:>8}  {} seats",
            departure.time,
            departure.service_class.label(),
            departure.price.to_string(),
            departure.available_seats
        );
    }

    let Some(departure) = departures.first() else {
        bail!("no departures found");
    };
    session.select_departure(departure.id.clone()).await?;

    let seats: Vec<_> = session.snapshot().await.seat_map.available().take(2).collect();
    if seats.len() < 2 {
        bail!("bus is full");
    }
    for seat in &seats {
        session.toggle_seat(*seat).await?;
    }
    println!("Seats {} and {} selected", seats[0], seats[1]);

    session.continue_to_passengers().await?;
    for (index, form) in demo_passengers().into_iter().enumerate() {
        session.update_passenger(index, form).await?;
    }
    session.continue_to_payment().await?;

    let link = session.share_link().await?;
    println!("Share link: {}", link.url);

    let mut paid = session.pay(demo_contact()).await?;
    paid.notification
        .wait_with_timeout(NOTIFICATION_TIMEOUT)
        .await
        .context("waiting for operator notification")?;

    print_ticket(&paid.confirmation, session.snapshot().await.booking.grand_total());
    Ok(session)
}

async fn pay_shared(env: BookingEnvironment, link: &str) -> anyhow::Result<Session> {
    let session = Session::open(env, link).await?;

    match session.notice().await {
        Some(Notice::InvalidLink { reason }) => bail!("cannot open link: {reason}"),
        Some(Notice::LinkExpired) => bail!("link expired"),
        None => {},
    }
    if session.phase().await != BookingPhase::Payment {
        bail!("link has no `pay` and `data` parameters");
    }

    let state = session.snapshot().await;
    if let (Some(criteria), Some(resumed), Some(countdown)) =
        (state.booking.criteria(), &state.resumed, state.countdown)
    {
        println!(
            "{} asks you to pay {} → {} on {}: {} (pay within {countdown})",
            resumed.requested_by,
            catalog::display_name(&criteria.origin),
            catalog::display_name(&criteria.destination),
            criteria.date.format("%d/%m/%Y"),
            state.booking.grand_total(),
        );
    }

    let mut paid = session.pay(demo_contact()).await?;
    paid.notification
        .wait_with_timeout(NOTIFICATION_TIMEOUT)
        .await
        .context("waiting for operator notification")?;

    print_ticket(&paid.confirmation, state.booking.grand_total());
    Ok(session)
}

fn print_ticket(confirmation: &Confirmation, total: Money) {
    println!("\nTicket {}  ({total})", confirmation.ticket_code);
    println!("{}\n", confirmation.pattern.render());
}
