use slip_resolver::cart::{CartItem, CartRegistry, CartStore, SharedCart};
use std::sync::Arc;
use std::thread;

fn item(name: &str, quantity: &str) -> CartItem {
    CartItem::new(name, quantity, None)
}

#[test]
fn test_cart_round_trip() {
    let cart = CartStore::new();
    cart.append(item("Crocin", "2"));
    cart.append(CartItem::new("Paracetamol", "10", Some("500mg".to_string())));

    assert_eq!(cart.len(), 2);
    let listed = cart.list();
    assert_eq!(listed[0], item("Crocin", "2"));
    assert_eq!(listed[1].potency.as_deref(), Some("500mg"));

    let remaining = cart.remove_at(0);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Paracetamol");
    assert_eq!(cart.list(), remaining);
}

#[test]
fn test_remove_at_negative_and_len_are_noops() {
    let cart = CartStore::new();
    cart.append(item("A", "1"));
    cart.append(item("B", "1"));
    let before = cart.list();

    assert_eq!(cart.remove_at(-1), before);
    assert_eq!(cart.remove_at(cart.len() as i64), before);
    assert_eq!(cart.len(), 2);
}

#[test]
fn test_remove_from_empty_cart() {
    let cart = CartStore::new();
    assert!(cart.remove_at(0).is_empty());
}

#[test]
fn test_concurrent_appends_are_all_kept() {
    let cart: SharedCart = Arc::new(CartStore::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cart = Arc::clone(&cart);
            thread::spawn(move || {
                for i in 0..50 {
                    cart.append(item(&format!("item-{}-{}", t, i), "1"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cart.len(), 400);

    // Each thread's items stay in their own append order
    let listed = cart.list();
    for t in 0..8 {
        let prefix = format!("item-{}-", t);
        let own: Vec<usize> = listed
            .iter()
            .filter(|i| i.name.starts_with(&prefix))
            .map(|i| i.name[prefix.len()..].parse().unwrap())
            .collect();
        assert_eq!(own, (0..50).collect::<Vec<_>>());
    }
}

#[test]
fn test_registry_isolates_sessions() {
    let registry = CartRegistry::new(300, 10);
    registry.cart_for("counter-1").append(item("Crocin", "1"));
    registry.cart_for("counter-2").append(item("Dolo", "3"));
    registry.cart_for("counter-2").append(item("Zyrtec", "1"));

    assert_eq!(registry.cart_for("counter-1").len(), 1);
    assert_eq!(registry.cart_for("counter-2").len(), 2);

    let stats = registry.stats();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.active_sessions, 2);
    assert_eq!(stats.total_items, 3);

    assert!(registry.remove_session("counter-1"));
    assert!(registry.cart_for("counter-1").is_empty());

    registry.clear();
    assert_eq!(registry.stats().total_sessions, 0);
}
