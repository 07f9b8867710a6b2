//! End-to-end client pipeline tests over the in-process transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use staffline_client::{
    LocalTransport, NotificationStore, SubscriptionManager, Transport, TransportHandle,
};
use staffline_types::{
    ChannelName, DomainEvent, EventFrame, Principal, RoleFlags, ToastLevel,
};

fn leave_requested(leave_id: i64) -> DomainEvent {
    DomainEvent::LeaveRequested {
        leave_id: Some(leave_id),
        employee_name: "Jane Cruz".to_string(),
        leave_type: "vacation".to_string(),
        leave_start_date: "2026-09-01".to_string(),
        leave_end_date: "2026-09-05".to_string(),
        department: "Engineering".to_string(),
    }
}

fn keyless_absence() -> DomainEvent {
    DomainEvent::AbsenceRequested {
        absence_id: None,
        employee_name: "No Id".to_string(),
        absence_type: "sick".to_string(),
        from_date: String::new(),
        to_date: String::new(),
        department: String::new(),
    }
}

/// Polls until the store satisfies the predicate or a second passes.
async fn wait_for<F>(store: &Arc<Mutex<NotificationStore>>, mut pred: F)
where
    F: FnMut(&NotificationStore) -> bool,
{
    for _ in 0..200 {
        if pred(&store.lock().unwrap()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("store never reached the expected state");
}

#[tokio::test]
async fn leave_request_flows_from_channel_to_store() {
    let transport = Arc::new(LocalTransport::new());
    let handle = TransportHandle::ready(Arc::clone(&transport) as Arc<dyn Transport>);
    let store = Arc::new(Mutex::new(NotificationStore::new()));
    let supervisor = Principal::staff(7, "Sup One");
    let flags = RoleFlags {
        supervisor: true,
        hr: false,
        super_admin: false,
    };

    let mut manager = SubscriptionManager::new(handle, Arc::clone(&store));
    assert!(manager.attach(&supervisor, flags).await);
    assert_eq!(
        manager.subscribed_channels(),
        vec![ChannelName::Supervisor(7)]
    );

    let channel = ChannelName::Supervisor(7);
    let event = leave_requested(42);
    transport.publish(&channel, EventFrame::for_event(&channel, &event));

    wait_for(&store, |s| s.unread_count() == 1).await;

    // The same event again is deduplicated by its domain key.
    transport.publish(&channel, EventFrame::for_event(&channel, &event));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.lock().unwrap().notifications().len(), 1);
    assert_eq!(store.lock().unwrap().unread_count(), 1);

    // A status update reconciles the row in place and queues a toast.
    let status = DomainEvent::RequestStatusUpdated {
        kind: "leave_status".to_string(),
        status: "approved".to_string(),
        employee_id: 5,
        request_id: 42,
        meta: serde_json::json!({}),
    };
    transport.publish(&channel, EventFrame::for_event(&channel, &status));

    wait_for(&store, |s| s.notifications()[0].data["status"] == "approved").await;

    let mut locked = store.lock().unwrap();
    assert_eq!(locked.unread_count(), 1);
    let toasts = locked.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Success);
    assert_eq!(toasts[0].message, "Leave request approved");
}

#[tokio::test]
async fn unlistened_events_are_ignored() {
    let transport = Arc::new(LocalTransport::new());
    let handle = TransportHandle::ready(Arc::clone(&transport) as Arc<dyn Transport>);
    let store = Arc::new(Mutex::new(NotificationStore::new()));

    let mut manager = SubscriptionManager::new(handle, Arc::clone(&store));
    assert!(
        manager
            .attach(&Principal::staff(3, "Admin"), RoleFlags::none())
            .await
    );

    let channel = ChannelName::Notifications;
    transport.publish(
        &channel,
        EventFrame {
            channel: channel.to_string(),
            event: ".PayrollPosted".to_string(),
            data: serde_json::json!({ "run": 12 }),
        },
    );
    transport.publish(
        &channel,
        EventFrame::for_event(&channel, &leave_requested(1)),
    );

    wait_for(&store, |s| s.unread_count() == 1).await;
    assert_eq!(store.lock().unwrap().notifications().len(), 1);
}

#[tokio::test]
async fn detach_then_reattach_delivers_each_event_once() {
    let transport = Arc::new(LocalTransport::new());
    let handle = TransportHandle::ready(Arc::clone(&transport) as Arc<dyn Transport>);
    let store = Arc::new(Mutex::new(NotificationStore::new()));
    let employee = Principal::employee(5, "Jane Cruz");
    let channel = ChannelName::Employee(5);

    let mut manager = SubscriptionManager::new(handle, Arc::clone(&store));
    assert!(manager.attach(&employee, RoleFlags::none()).await);
    assert!(manager.attach(&employee, RoleFlags::none()).await);
    assert_eq!(transport.subscriber_count(&channel), 1);

    manager.detach();
    manager.detach();
    assert_eq!(transport.subscriber_count(&channel), 0);

    assert!(manager.attach(&employee, RoleFlags::none()).await);
    assert_eq!(transport.subscriber_count(&channel), 1);

    // Keyless events materialize unconditionally, so a stacked listener
    // would show up as a double row.
    transport.publish(
        &channel,
        EventFrame::for_event(&channel, &keyless_absence()),
    );
    wait_for(&store, |s| !s.notifications().is_empty()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.lock().unwrap().notifications().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn attach_degrades_quietly_when_transport_never_readies() {
    let transport = Arc::new(LocalTransport::new());
    let (handle, _signal) = TransportHandle::pending(Arc::clone(&transport) as Arc<dyn Transport>);
    let store = Arc::new(Mutex::new(NotificationStore::new()));

    let mut manager = SubscriptionManager::new(handle, Arc::clone(&store));
    let attached = manager
        .attach(&Principal::staff(1, "Admin"), RoleFlags::none())
        .await;

    assert!(!attached);
    assert!(manager.subscribed_channels().is_empty());
    assert_eq!(transport.subscriber_count(&ChannelName::Notifications), 0);
}

#[tokio::test(start_paused = true)]
async fn attach_resumes_when_transport_becomes_ready_mid_wait() {
    let transport = Arc::new(LocalTransport::new());
    let (handle, signal) = TransportHandle::pending(Arc::clone(&transport) as Arc<dyn Transport>);
    let store = Arc::new(Mutex::new(NotificationStore::new()));
    let mut manager = SubscriptionManager::new(handle, Arc::clone(&store));

    let attach = tokio::spawn(async move {
        let attached = manager
            .attach(&Principal::staff(1, "Admin"), RoleFlags::none())
            .await;
        (attached, manager)
    });

    // Let a few retry intervals elapse before the connection lands.
    tokio::time::sleep(Duration::from_millis(600)).await;
    signal.mark_ready();

    let (attached, manager) = attach.await.expect("attach task");
    assert!(attached);
    assert_eq!(
        manager.subscribed_channels(),
        vec![ChannelName::Notifications]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_attach_stops_waiting() {
    let transport = Arc::new(LocalTransport::new());
    let (handle, _signal) = TransportHandle::pending(Arc::clone(&transport) as Arc<dyn Transport>);
    let store = Arc::new(Mutex::new(NotificationStore::new()));
    let mut manager = SubscriptionManager::new(handle, Arc::clone(&store));
    let cancel = manager.cancel_handle();

    let attach = tokio::spawn(async move {
        manager
            .attach(&Principal::staff(1, "Admin"), RoleFlags::none())
            .await
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();

    assert!(!attach.await.expect("attach task"));
}
