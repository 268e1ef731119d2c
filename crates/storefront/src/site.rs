//! Fixed site content: café locations, reviews, featured drinks, reservation
//! slots and the rewards catalog.

/// A café location.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    /// Stable identifier stored in `reservations.location_id`.
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub hours: &'static [&'static str],
}

pub const LOCATIONS: &[Location] = &[
    Location {
        id: "downtown",
        name: "Downtown Café",
        address: "123 Green Street, Eco City, EC 12345",
        phone: "(555) 123-4567",
        hours: &["Mon-Fri: 6:30 AM - 8:00 PM", "Sat-Sun: 7:00 AM - 9:00 PM"],
    },
    Location {
        id: "university",
        name: "University Branch",
        address: "456 Campus Avenue, Student District, EC 67890",
        phone: "(555) 987-6543",
        hours: &["Mon-Thu: 6:00 AM - 10:00 PM", "Fri-Sun: 7:00 AM - 11:00 PM"],
    },
    Location {
        id: "waterfront",
        name: "Waterfront Location",
        address: "789 Harbor View, Marina District, EC 54321",
        phone: "(555) 456-7890",
        hours: &["Daily: 7:00 AM - 8:00 PM"],
    },
];

/// Look up a location by its identifier.
#[must_use]
pub fn location(id: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|l| l.id == id)
}

/// Display name for a stored location id, falling back to the raw id.
#[must_use]
pub fn location_name(id: &str) -> &str {
    location(id).map_or(id, |l| l.name)
}

/// Bookable reservation start times (24h `HH:MM`).
pub const TIME_SLOTS: &[&str] = &[
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30",
    "13:00", "13:30", "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
    "18:00", "18:30", "19:00",
];

#[must_use]
pub fn is_time_slot(time: &str) -> bool {
    TIME_SLOTS.contains(&time)
}

/// Largest party a single reservation may seat.
pub const MAX_PARTY_SIZE: i32 = 12;

// =============================================================================
// Home page
// =============================================================================

/// A customer testimonial.
#[derive(Debug, Clone, Copy)]
pub struct Review {
    pub name: &'static str,
    pub role: &'static str,
    pub content: &'static str,
    pub rating: u8,
}

pub const REVIEWS: &[Review] = &[
    Review {
        name: "Sarah Martinez",
        role: "Environmental Scientist",
        content: "Finally, a café that aligns with my values! The coffee is exceptional and knowing it's sustainably sourced makes every sip even better. The compostable cups are a game-changer.",
        rating: 5,
    },
    Review {
        name: "Michael Chen",
        role: "Local Artist",
        content: "Eco Brews has become my daily ritual. The atmosphere is perfect for creative work, and their fair trade Ethiopian blend is absolutely divine. Plus, I love earning rewards for being eco-conscious!",
        rating: 5,
    },
    Review {
        name: "Emma Thompson",
        role: "University Student",
        content: "As a student on a budget, I appreciate that choosing sustainable options doesn't break the bank here. The Golden Turmeric Latte is my go-to study fuel, and the baristas are incredibly knowledgeable.",
        rating: 5,
    },
    Review {
        name: "David Rodriguez",
        role: "Tech Entrepreneur",
        content: "The convenience of ordering ahead combined with the quality of their coffee is unmatched. I love being able to see the exact impact of my purchases - transparency at its finest!",
        rating: 5,
    },
];

/// Seconds each review stays on screen before the carousel advances.
pub const REVIEW_ROTATION_SECS: u64 = 5;

/// Index of the review showing at `unix_secs`, advancing one review per
/// rotation interval.
#[must_use]
pub fn review_index_at(unix_secs: u64) -> usize {
    let len = REVIEWS.len() as u64;
    if len == 0 {
        return 0;
    }
    usize::try_from((unix_secs / REVIEW_ROTATION_SECS) % len).unwrap_or(0)
}

/// A drink shown on the home page when the menu cannot be read.
#[derive(Debug, Clone, Copy)]
pub struct FeaturedDrink {
    pub name: &'static str,
    pub description: &'static str,
    pub price: &'static str,
    pub rating: &'static str,
    pub badges: &'static [&'static str],
    pub popular: bool,
}

pub const FEATURED_DRINKS: &[FeaturedDrink] = &[
    FeaturedDrink {
        name: "Earth Blend Espresso",
        description: "Rich, full-bodied espresso sourced from Ethiopian highlands with notes of dark chocolate and caramel.",
        price: "$4.50",
        rating: "4.9",
        badges: &["Organic", "Fair Trade"],
        popular: true,
    },
    FeaturedDrink {
        name: "Golden Turmeric Latte",
        description: "Warming blend of organic turmeric, ginger, and coconut milk with a touch of local honey.",
        price: "$5.25",
        rating: "4.8",
        badges: &["Vegan", "Anti-inflammatory"],
        popular: false,
    },
    FeaturedDrink {
        name: "Rainforest Cold Brew",
        description: "Smooth, chocolatey cold brew supporting rainforest conservation. Served with reusable glass.",
        price: "$4.75",
        rating: "4.9",
        badges: &["Conservation Partner", "Organic"],
        popular: true,
    },
];

/// One of the brand's values, shown in the mission section.
#[derive(Debug, Clone, Copy)]
pub struct MissionValue {
    pub title: &'static str,
    pub description: &'static str,
}

pub const MISSION_VALUES: &[MissionValue] = &[
    MissionValue {
        title: "Sustainable Sourcing",
        description: "Direct partnerships with eco-conscious farmers who practice regenerative agriculture and fair trade principles.",
    },
    MissionValue {
        title: "Zero Waste Goal",
        description: "Compostable cups, reusable packaging, and a comprehensive recycling program to minimize our environmental footprint.",
    },
    MissionValue {
        title: "Carbon Neutral",
        description: "Powered by 100% renewable energy and offset our carbon emissions through verified environmental projects.",
    },
    MissionValue {
        title: "Community First",
        description: "Supporting local communities, providing living wages, and creating spaces that bring people together.",
    },
];

/// Headline impact figures.
pub const IMPACT_STATS: &[(&str, &str)] = &[
    ("50,000+", "Plastic cups saved"),
    ("25", "Fair trade partnerships"),
    ("100%", "Renewable energy"),
];

// =============================================================================
// Loyalty
// =============================================================================

/// A reward members can redeem points for.
#[derive(Debug, Clone, Copy)]
pub struct Reward {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: i64,
}

pub const REWARDS: &[Reward] = &[
    Reward {
        id: "plant-milk-upgrade",
        name: "Plant-Milk Upgrade",
        description: "Oat, almond or coconut milk in any drink",
        cost: 50,
    },
    Reward {
        id: "free-pastry",
        name: "Free Pastry",
        description: "Any pastry from the daily bake",
        cost: 100,
    },
    Reward {
        id: "free-drink",
        name: "Free Drink",
        description: "Any handcrafted drink, any size",
        cost: 150,
    },
    Reward {
        id: "reusable-cup",
        name: "Reusable Bamboo Cup",
        description: "Our signature travel cup",
        cost: 400,
    },
    Reward {
        id: "beans-bag",
        name: "Bag of House Beans",
        description: "250g of our Earth Blend, whole bean or ground",
        cost: 600,
    },
];

/// Look up a reward by its identifier.
#[must_use]
pub fn reward(id: &str) -> Option<&'static Reward> {
    REWARDS.iter().find(|r| r.id == id)
}

/// Points awarded for an in-store visit check-in.
pub const CHECK_IN_POINTS: i64 = 10;
