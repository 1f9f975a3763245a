use std::rc::Rc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use locator::{Completion, Container, Error, ErrorKind, Producer};
use tokio::sync::oneshot;
use tokio::task::{self, LocalSet};
use tracing::{error, info, warn, Level};

#[derive(Debug)]
struct Database {
    url: String,
    connected: bool,
}

#[derive(Debug)]
struct Token(u64);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

fn build(connects: Rc<AtomicUsize>) -> Result<Container, Error> {
    let container = Container::new();

    container
        .register_value("database_url", String::from("postgres://localhost/app"))?
        .register(
            "db",
            Producer::deferred(move |c, done: Completion<Database>| {
                connects.fetch_add(1, Ordering::SeqCst);
                let url = c.resolve::<String>("database_url")?;

                // Connect on a later turn of the event loop.
                task::spawn_local(async move {
                    task::yield_now().await;
                    done.ok(Database {
                        url: (*url).clone(),
                        connected: true,
                    });
                });
                Ok(())
            }),
        )?;

    let token = container.mark_as_factory(Producer::new(|_c| {
        Ok(Token(NEXT_TOKEN.fetch_add(1, Ordering::SeqCst)))
    }))?;
    container.register("token", token)?;

    Ok(container)
}

async fn run() -> Result<(), Error> {
    let connects = Rc::new(AtomicUsize::new(0));
    let container = build(connects.clone())?;

    let mut pending = Vec::new();
    for n in 0..3 {
        let (tx, rx) = oneshot::channel();
        container.resolve_with::<Database, _>("db", move |db| {
            if tx.send(db).is_err() {
                warn!("request {} was dropped before db resolved", n);
            }
        })?;
        pending.push(rx);
    }

    for (n, rx) in pending.into_iter().enumerate() {
        let db = rx
            .await
            .map_err(|_| Error::new(ErrorKind::ProducerFailure, "callback dropped"))??;
        info!(
            "request {} got {} (connected: {})",
            n, db.url, db.connected
        );
    }
    info!("producer ran {} time(s)", connects.load(Ordering::SeqCst));

    let first = container.resolve::<Token>("token")?;
    let second = container.resolve::<Token>("token")?;
    info!("tokens: {:?} then {:?}", first, second);

    info!("registered ids: {:?}", container.ids());
    info!("{:?}", container);

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let local = LocalSet::new();
    if let Err(err) = local.run_until(run()).await {
        error!("{}", err);
        std::process::exit(1);
    }
}
