//! Static guest-facing catalog of bookable rooms, spa treatments, events and
//! dining menus.

use serde::{Deserialize, Serialize};

use crate::engine::{PriceUnit, PricedOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Room,
    Spa,
    Event,
    Dining,
}

impl BookingKind {
    pub const ALL: [BookingKind; 4] = [
        BookingKind::Room,
        BookingKind::Spa,
        BookingKind::Event,
        BookingKind::Dining,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Room => "room",
            BookingKind::Spa => "spa",
            BookingKind::Event => "event",
            BookingKind::Dining => "dining",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.iter().copied().find(|k| k.as_str().eq_ignore_ascii_case(s))
    }

    /// Confirmation code prefix
    pub fn code_prefix(&self) -> &'static str {
        match self {
            BookingKind::Room => "RM",
            BookingKind::Spa => "SPA",
            BookingKind::Event => "EV",
            BookingKind::Dining => "DN",
        }
    }

    /// Service type matched against promo code applicability
    pub fn service_type(&self) -> &'static str {
        match self {
            BookingKind::Room => "Rooms",
            BookingKind::Spa => "Spa",
            BookingKind::Event => "Events",
            BookingKind::Dining => "Dining",
        }
    }
}

impl std::fmt::Display for BookingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub kind: BookingKind,
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub unit: PriceUnit,
    pub max_guests: u32,
    #[serde(default)]
    pub extras: Vec<PricedOption>,
}

/// An add-on offered with every booking of a kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    pub kind: BookingKind,
    #[serde(flatten)]
    pub option: PricedOption,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub items: Vec<CatalogItem>,
    pub addons: Vec<Addon>,
}

fn item(
    kind: BookingKind,
    id: &str,
    name: &str,
    description: &str,
    unit_price: f64,
    unit: PriceUnit,
    max_guests: u32,
    extras: Vec<PricedOption>,
) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        description: description.to_string(),
        unit_price,
        unit,
        max_guests,
        extras,
    }
}

fn addon(kind: BookingKind, id: &str, name: &str, price: f64) -> Addon {
    Addon {
        kind,
        option: PricedOption::new(id, name, price),
    }
}

impl Catalog {
    /// The hotel's built-in offer
    pub fn seeded() -> Self {
        use BookingKind::*;
        use PriceUnit::*;

        let items = vec![
            // Rooms
            item(
                Room,
                "deluxe-king",
                "Deluxe King Room",
                "King bed, city view, rain shower.",
                220.0,
                PerNight,
                2,
                vec![
                    PricedOption::new("extra-bed", "Extra bed", 45.0),
                    PricedOption::new("city-view-upgrade", "High floor", 30.0),
                ],
            ),
            item(
                Room,
                "ocean-suite",
                "Ocean Suite",
                "Separate living room and private balcony facing the sea.",
                480.0,
                PerNight,
                4,
                vec![
                    PricedOption::new("extra-bed", "Extra bed", 45.0),
                    PricedOption::new("champagne", "Champagne on arrival", 90.0),
                ],
            ),
            item(
                Room,
                "family-room",
                "Family Room",
                "Two queen beds and a kids' corner.",
                310.0,
                PerNight,
                5,
                vec![PricedOption::new("crib", "Baby crib", 0.0)],
            ),
            // Spa
            item(
                Spa,
                "hot-stone",
                "Hot Stone Massage",
                "75 minutes of basalt stone therapy.",
                140.0,
                Flat,
                1,
                vec![PricedOption::new("aromatherapy", "Aromatherapy oils", 20.0)],
            ),
            item(
                Spa,
                "signature-facial",
                "Signature Facial",
                "Deep cleanse, exfoliation and mask.",
                110.0,
                Flat,
                1,
                vec![PricedOption::new("eye-treatment", "Eye treatment", 25.0)],
            ),
            item(
                Spa,
                "couples-ritual",
                "Couples Ritual",
                "Side-by-side massage followed by a private bath.",
                260.0,
                Flat,
                2,
                vec![PricedOption::new("sparkling-wine", "Sparkling wine", 35.0)],
            ),
            // Events
            item(
                Event,
                "wine-tasting",
                "Sommelier Wine Tasting",
                "Six wines from the cellar with cheese pairings.",
                65.0,
                PerPerson,
                20,
                vec![PricedOption::new("take-home-bottle", "Take-home bottle", 40.0)],
            ),
            item(
                Event,
                "jazz-night",
                "Jazz on the Terrace",
                "Live quartet every Friday evening.",
                40.0,
                PerPerson,
                60,
                vec![PricedOption::new("reserved-table", "Reserved table", 25.0)],
            ),
            item(
                Event,
                "new-year-gala",
                "New Year's Eve Gala",
                "Five-course dinner, live band and fireworks.",
                180.0,
                PerPerson,
                150,
                vec![],
            ),
            // Dining
            item(
                Dining,
                "tasting-menu",
                "Chef's Tasting Menu",
                "Seven seasonal courses.",
                95.0,
                PerPerson,
                12,
                vec![PricedOption::new("wine-pairing", "Wine pairing", 55.0)],
            ),
            item(
                Dining,
                "seafood-platter",
                "Seafood Platter",
                "Oysters, prawns, crab and lobster for sharing.",
                70.0,
                PerPerson,
                8,
                vec![],
            ),
            item(
                Dining,
                "sunday-brunch",
                "Sunday Brunch",
                "Buffet brunch with free-flowing juices.",
                45.0,
                PerPerson,
                20,
                vec![PricedOption::new("bottomless-mimosa", "Bottomless mimosas", 25.0)],
            ),
        ];

        let addons = vec![
            addon(Room, "airport-transfer", "Airport transfer", 60.0),
            addon(Room, "breakfast", "Breakfast package", 25.0),
            addon(Room, "late-checkout", "Late checkout", 40.0),
            addon(Spa, "sauna-access", "Sauna access", 15.0),
            addon(Spa, "robe-gift", "Take-home robe", 50.0),
            addon(Event, "valet-parking", "Valet parking", 20.0),
            addon(Dining, "birthday-cake", "Birthday cake", 30.0),
            addon(Dining, "valet-parking", "Valet parking", 20.0),
        ];

        Self { items, addons }
    }

    pub fn item(&self, kind: BookingKind, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.kind == kind && i.id == id)
    }

    pub fn items_of(&self, kind: BookingKind) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }

    pub fn addon(&self, kind: BookingKind, id: &str) -> Option<&PricedOption> {
        self.addons
            .iter()
            .find(|a| a.kind == kind && a.option.id == id)
            .map(|a| &a.option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_catalog_covers_every_kind() {
        let catalog = Catalog::seeded();
        for kind in BookingKind::ALL {
            assert!(catalog.items_of(kind).count() > 0, "no items for {}", kind);
            assert!(catalog.addons.iter().any(|a| a.kind == kind), "no addons for {}", kind);
        }
    }

    #[test]
    fn test_item_ids_unique_per_kind() {
        let catalog = Catalog::seeded();
        for item in &catalog.items {
            let same = catalog
                .items
                .iter()
                .filter(|i| i.kind == item.kind && i.id == item.id)
                .count();
            assert_eq!(same, 1, "duplicate id {}", item.id);
        }
    }

    #[test]
    fn test_lookup_is_scoped_by_kind() {
        let catalog = Catalog::seeded();
        assert!(catalog.item(BookingKind::Room, "ocean-suite").is_some());
        assert!(catalog.item(BookingKind::Spa, "ocean-suite").is_none());
        assert!(catalog.addon(BookingKind::Dining, "valet-parking").is_some());
        assert!(catalog.addon(BookingKind::Spa, "valet-parking").is_none());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(BookingKind::parse("ROOM"), Some(BookingKind::Room));
        assert_eq!(BookingKind::parse("golf"), None);
        assert_eq!(BookingKind::Dining.code_prefix(), "DN");
    }
}
