mod utils;

use {
	anyhow::Result,
	roslink::{prelude::*, tcpros},
	utils::{local_uri, millis, timeout_ms, wait_for_subscribers},
};

#[tokio::test]
async fn shutdown_closes_the_advertised_ports() -> Result<()> {
	let publisher = Node::new("/pub");
	let (feed, inbox) = tokio::sync::mpsc::channel::<u64>(10);
	publisher
		.advertise("/beat", MessageStream::from_channel(inbox))
		.await?;
	let port = publisher.slave().topic_port("/beat").expect("advertised");

	let subscriber = Node::new("/sub");
	let mut beats = subscriber.subscribe::<u64>("/beat")?;
	subscriber.slave().publisher_update("/beat", [local_uri(port)]);
	timeout_ms(5000, wait_for_subscribers(&publisher.slave(), "/beat", 1))
		.await?;

	feed.send(1).await?;
	assert_eq!(timeout_ms(5000, beats.next()).await?, Some(1));

	publisher.shutdown().await;

	// the accept task is gone and the listener is closed
	assert!(
		tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err(),
		"advertised port must refuse connections after shutdown",
	);

	// tearing the subscriber down ends its stream
	subscriber.shutdown().await;
	assert_eq!(timeout_ms(5000, beats.next()).await?, None);
	Ok(())
}

#[tokio::test]
async fn run_node_drives_the_program_until_shutdown() -> Result<()> {
	let (handoff, slave) = tokio::sync::oneshot::channel();

	let driver = tokio::spawn(run_node("/driver", move |node| async move {
		let (_feed, inbox) = tokio::sync::mpsc::channel::<u64>(1);
		node.advertise("/beat", MessageStream::from_channel(inbox)).await?;
		handoff.send(node.slave()).ok();
		Ok(())
	}));

	let slave = slave.await?;
	assert!(slave.topic_port("/beat").is_some());
	assert_eq!(slave.master_uri(), "");

	slave.shutdown();
	timeout_ms(5000, driver).await?.expect("driver must not panic")?;
	Ok(())
}

#[tokio::test]
async fn slow_client_is_isolated_and_sheds_load() -> Result<()> {
	let publisher = Node::new("/firehose");
	let (feed, inbox) = tokio::sync::mpsc::channel::<Vec<u8>>(1);
	publisher
		.advertise("/blast", MessageStream::from_channel(inbox))
		.await?;
	let port = publisher.slave().topic_port("/blast").expect("advertised");
	let topic = TopicName::from("/blast");

	// a hand-rolled subscriber that negotiates and then never reads
	let mut stalled = tcpros::Link::connect(&local_uri(port)).await?;
	stalled
		.send(
			tcpros::ConnectionHeader::for_subscription::<Vec<u8>>(
				"/stalled", &topic,
			)
			.encode(),
		)
		.await?;
	stalled.recv().await?.expect("negotiation reply");

	// and a real one that keeps up
	let subscriber = Node::new("/fast");
	let mut blast = subscriber.subscribe::<Vec<u8>>("/blast")?;
	subscriber.slave().publisher_update("/blast", [local_uri(port)]);
	timeout_ms(5000, wait_for_subscribers(&publisher.slave(), "/blast", 2))
		.await?;

	let consumer = tokio::spawn(async move {
		let mut received = 0usize;
		while received < 100 {
			if blast.next().await.is_none() {
				break;
			}
			received += 1;
		}
		received
	});

	let payload = vec![0u8; 512 * 1024];
	for _ in 0..100 {
		feed.send(payload.clone()).await?;
		tokio::time::sleep(millis(5)).await;
	}

	let received = timeout_ms(30000, consumer).await??;
	assert_eq!(received, 100, "the live subscriber must not be starved");

	let publications = publisher.slave().snapshot_publications();
	let dropped: u64 = publications[0]
		.subscribers
		.iter()
		.map(|client| client.stats.dropped)
		.sum();
	assert!(dropped > 0, "the stalled subscriber must shed load");

	drop(stalled);
	Ok(())
}

#[tokio::test]
async fn master_uri_comes_from_the_config() -> Result<()> {
	let node = Node::with_config(
		"/configured",
		Config::builder()
			.with_master_uri("http://master:11311".into())
			.build()?,
	);
	assert_eq!(node.master_uri(), "http://master:11311");
	assert_eq!(node.slave().master_uri(), "http://master:11311");
	Ok(())
}
