//! Demonstration catalog loaded into an empty store at startup.

use tracing::info;

use crate::errors::StoreError;
use crate::models::Product;
use crate::store::ProductStore;

const IMAGE_BASE: &str = "https://images.unsplash.com";

fn product(
    id: &str,
    name: &str,
    description: &str,
    price: u64,
    image: &str,
    stock: u32,
) -> Product {
    Product::new(id, name, price, "eur", stock)
        .with_description(description)
        .with_image(format!("{IMAGE_BASE}/{image}?w=800&q=80"))
}

pub fn default_catalog() -> Vec<Product> {
    vec![
        product(
            "prod-1",
            "Vintage Denim Jacket",
            "A classic denim jacket in 90s vintage style.",
            4500,
            "photo-1576871333019-220ef346ddbb",
            10,
        ),
        product(
            "prod-2",
            "Premium Sneakers",
            "Comfortable, elegant trainers for every occasion.",
            8900,
            "photo-1542291026-7eec264c27ff",
            5,
        ),
        product(
            "prod-3",
            "Leather Handbag",
            "Handcrafted genuine leather handbag with a careful finish.",
            12000,
            "photo-1548036328-c9fa89d128fa",
            3,
        ),
        product(
            "prod-4",
            "Minimalist Watch",
            "Clean design and a precision movement for a refined look.",
            15000,
            "photo-1523275335684-37898b6baf30",
            7,
        ),
        product(
            "prod-5",
            "Sunglasses",
            "Full UV protection in a light, elegant frame.",
            3500,
            "photo-1511499767390-90342f568952",
            12,
        ),
        product(
            "prod-6",
            "Vintage Camera",
            "Capture your moments with a timeless film look.",
            25000,
            "photo-1516035069371-29a1b244cc32",
            2,
        ),
        product(
            "prod-7",
            "Wireless Headphones",
            "High-fidelity sound with active noise cancelling.",
            19900,
            "photo-1505740420928-5e560c06d30e",
            8,
        ),
        product(
            "prod-8",
            "Monstera Plant",
            "Bring a touch of nature indoors with this striking plant.",
            2500,
            "photo-1614594975525-e45190c55d0b",
            15,
        ),
        product(
            "prod-9",
            "Bluetooth Speaker",
            "Powerful, portable sound for every adventure.",
            7900,
            "photo-1608156639585-b3a032ef9689",
            10,
        ),
        product(
            "prod-10",
            "Leather Notebook",
            "Made for sketches, thoughts and creative projects.",
            1800,
            "photo-1531346878377-a5be20888e57",
            20,
        ),
    ]
}

/// Loads [`default_catalog`] when `store` holds no products.
///
/// Returns the number of products written.
pub async fn seed_if_empty(store: &dyn ProductStore) -> Result<usize, StoreError> {
    if !store.is_empty().await? {
        return Ok(0);
    }

    let catalog = default_catalog();
    let count = catalog.len();
    for product in catalog {
        store.upsert_product(product).await?;
    }
    info!(count, backend = store.backend(), "Seeded demonstration catalog");
    Ok(count)
}
