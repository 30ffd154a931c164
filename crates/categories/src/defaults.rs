pub struct DefaultCategory {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub is_expense: bool,
}

const fn expense(name: &'static str, icon: &'static str, color: &'static str) -> DefaultCategory {
    DefaultCategory { name, icon, color, is_expense: true }
}

const fn income(name: &'static str, icon: &'static str, color: &'static str) -> DefaultCategory {
    DefaultCategory { name, icon, color, is_expense: false }
}

const FOOD: &str = "#FFB3BA";
const TRANSPORT: &str = "#BAE1FF";
const HOUSING: &str = "#FFDFBA";
const UTILITIES: &str = "#D4F0F0";
const ENTERTAINMENT: &str = "#D5AAFF";
const SHOPPING: &str = "#FFD1DC";
const HEALTH: &str = "#BAFFC9";
const EDUCATION: &str = "#FDFD96";
const GIFT: &str = "#FFC3A0";
const OTHER: &str = "#E2F0CB";
const SALARY: &str = "#97C1A9";
const BUSINESS: &str = "#85E3FF";
const INVESTMENT: &str = "#B6CFB6";

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    // Food & dining
    expense("Groceries", "ic_category_food", FOOD),
    expense("Restaurants", "ic_category_food", FOOD),
    expense("Cafe", "ic_category_food", FOOD),
    // Transport
    expense("Public transport", "ic_category_transport", TRANSPORT),
    expense("Taxi", "ic_category_transport", TRANSPORT),
    expense("Fuel", "ic_category_transport", TRANSPORT),
    // Housing & utilities
    expense("Rent", "ic_category_housing", HOUSING),
    expense("Mortgage", "ic_category_housing", HOUSING),
    expense("Electricity", "ic_category_utilities", UTILITIES),
    expense("Water", "ic_category_utilities", UTILITIES),
    expense("Internet", "ic_category_utilities", UTILITIES),
    expense("Phone", "ic_category_utilities", UTILITIES),
    // Entertainment
    expense("Movies", "ic_category_entertainment", ENTERTAINMENT),
    expense("Concerts", "ic_category_entertainment", ENTERTAINMENT),
    expense("Subscriptions", "ic_category_entertainment", ENTERTAINMENT),
    // Shopping
    expense("Clothes", "ic_category_shopping", SHOPPING),
    expense("Electronics", "ic_category_shopping", SHOPPING),
    expense("Home goods", "ic_category_shopping", SHOPPING),
    // Health
    expense("Medical", "ic_category_health", HEALTH),
    expense("Pharmacy", "ic_category_health", HEALTH),
    expense("Fitness", "ic_category_health", HEALTH),
    // Education
    expense("Books", "ic_category_education", EDUCATION),
    expense("Courses", "ic_category_education", EDUCATION),
    // Other
    expense("Personal care", "ic_category_other", OTHER),
    expense("Gifts", "ic_category_gift", GIFT),
    expense("Travel", "ic_category_entertainment", ENTERTAINMENT),
    expense("Taxes", "ic_category_other", OTHER),
    expense("Other expense", "ic_category_other", OTHER),
    // Work
    income("Salary", "ic_category_salary", SALARY),
    income("Bonus", "ic_category_salary", SALARY),
    income("Overtime", "ic_category_salary", SALARY),
    income("Part-time", "ic_category_salary", SALARY),
    // Business
    income("Business income", "ic_category_business", BUSINESS),
    income("Freelance", "ic_category_business", BUSINESS),
    income("Consulting", "ic_category_business", BUSINESS),
    income("Side hustle", "ic_category_business", BUSINESS),
    // Investments
    income("Dividends", "ic_category_investment", INVESTMENT),
    income("Stock profits", "ic_category_investment", INVESTMENT),
    income("Crypto", "ic_category_investment", INVESTMENT),
    income("Rent income", "ic_category_investment", INVESTMENT),
    income("Interest", "ic_category_investment", INVESTMENT),
    income("Pension", "ic_category_investment", INVESTMENT),
    // Other
    income("Gifts received", "ic_category_gift", GIFT),
    income("Cashback", "ic_category_gift", GIFT),
    income("Refund", "ic_category_other", OTHER),
    income("Selling items", "ic_category_business", BUSINESS),
    income("Government benefits", "ic_category_other", OTHER),
    income("Alimony", "ic_category_other", OTHER),
    income("Lottery", "ic_category_gift", GIFT),
    income("Scholarship", "ic_category_education", EDUCATION),
    income("Other income", "ic_category_other", OTHER),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_defaults_are_unique_per_type() {
        let keys: HashSet<_> = DEFAULT_CATEGORIES.iter().map(|c| (c.name, c.is_expense)).collect();
        assert_eq!(keys.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_defaults_cover_both_types() {
        assert!(DEFAULT_CATEGORIES.iter().any(|c| c.is_expense));
        assert!(DEFAULT_CATEGORIES.iter().any(|c| !c.is_expense));
    }
}
