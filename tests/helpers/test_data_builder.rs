// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use bake_convert::domain::recipe::{PanConfig, PanShape, Recipe, RecipeMethod, RecipeYield};
use bake_convert::domain::types::IngredientCategory;
use bake_convert::domain::yield_loss::StageLossRates;
use bake_convert::domain::Ingredient;

// ==========================================
// Ingredient 构建器
// ==========================================

pub struct IngredientBuilder {
    id: String,
    name: Option<String>,
    category: IngredientCategory,
    amount: f64,
    unit: Option<String>,
    is_flour: bool,
    moisture_pct: Option<f64>,
}

impl IngredientBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            category: IngredientCategory::Other,
            amount: 0.0,
            unit: None,
            is_flour: false,
            moisture_pct: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn category(mut self, category: IngredientCategory) -> Self {
        self.category = category;
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn flour(mut self) -> Self {
        self.is_flour = true;
        self
    }

    pub fn moisture(mut self, pct: f64) -> Self {
        self.moisture_pct = Some(pct);
        self
    }

    pub fn build(self) -> Ingredient {
        let name = self.name.unwrap_or_else(|| self.id.clone());
        let mut ingredient = Ingredient::new(&self.id, &name, self.category, self.amount);
        if let Some(unit) = self.unit {
            ingredient.unit = unit;
        }
        ingredient.is_flour = self.is_flour;
        ingredient.moisture_pct = self.moisture_pct;
        ingredient
    }
}

// ==========================================
// Recipe 构建器
// ==========================================

pub struct RecipeBuilder {
    name: String,
    ingredients: Vec<Ingredient>,
    pan: PanConfig,
    method: RecipeMethod,
    yield_quantity: f64,
    yield_unit: String,
    product_category: Option<String>,
    product_key: Option<String>,
}

impl RecipeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ingredients: Vec::new(),
            pan: rectangle_pan(20.0, 10.0, 8.0, 1.0),
            method: RecipeMethod::new("straight"),
            yield_quantity: 1.0,
            yield_unit: "loaf".to_string(),
            product_category: None,
            product_key: None,
        }
    }

    pub fn ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn add(self, id: &str, category: IngredientCategory, amount: f64) -> Self {
        self.ingredient(IngredientBuilder::new(id).category(category).amount(amount).build())
    }

    pub fn pan(mut self, pan: PanConfig) -> Self {
        self.pan = pan;
        self
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = RecipeMethod::new(method);
        self
    }

    pub fn fermentation_minutes(mut self, minutes: f64) -> Self {
        self.method.fermentation_minutes = Some(minutes);
        self
    }

    pub fn yield_of(mut self, quantity: f64, unit: &str) -> Self {
        self.yield_quantity = quantity;
        self.yield_unit = unit.to_string();
        self
    }

    pub fn product(mut self, category: &str, key: &str) -> Self {
        self.product_category = Some(category.to_string());
        self.product_key = Some(key.to_string());
        self
    }

    pub fn build(self) -> Recipe {
        Recipe {
            name: self.name,
            ingredients: self.ingredients,
            pan: self.pan,
            method: self.method,
            yield_info: RecipeYield {
                quantity: self.yield_quantity,
                unit: self.yield_unit,
            },
            product_category: self.product_category,
            product_key: self.product_key,
        }
    }
}

// ==========================================
// 常用数据
// ==========================================

pub fn rectangle_pan(length_cm: f64, width_cm: f64, height_cm: f64, fill_ratio: f64) -> PanConfig {
    PanConfig::new(
        PanShape::Rectangle {
            length_cm,
            width_cm,
            height_cm,
        },
        fill_ratio,
    )
}

pub fn round_pan(diameter_cm: f64, height_cm: f64, fill_ratio: f64) -> PanConfig {
    PanConfig::new(
        PanShape::Round {
            diameter_cm,
            height_cm,
        },
        fill_ratio,
    )
}

/// 基础白吐司（粉 500g，含水 65%）
pub fn white_bread() -> Recipe {
    RecipeBuilder::new("白吐司")
        .add("bread_flour", IngredientCategory::Flour, 500.0)
        .add("water", IngredientCategory::Liquid, 325.0)
        .add("sugar", IngredientCategory::Sugar, 40.0)
        .add("butter", IngredientCategory::Fat, 30.0)
        .add("salt", IngredientCategory::Salt, 9.0)
        .add("instant_yeast", IngredientCategory::Leavening, 5.0)
        .fermentation_minutes(90.0)
        .build()
}

/// 面包类经验损耗率 {1, 1.5, 2, 1, 12, 2}
pub fn bread_loss_rates() -> StageLossRates {
    StageLossRates {
        mixing: 1.0,
        fermentation: 1.5,
        dividing: 2.0,
        shaping: 1.0,
        baking: 12.0,
        cooling: 2.0,
    }
}
