use std::fmt;

use crate::bom::Bom;
use crate::error::{LciError, LciResult};
use crate::product::ProductRef;
use crate::quantity::{Operand, Quantity};

/// "This much of this product".
#[derive(Debug, Clone)]
pub struct ProductInstance {
    pub product: ProductRef,
    pub quantity: Quantity,
}

/// Right-hand side of an instance operation.
#[derive(Debug, Clone)]
pub enum InstanceOperand {
    Instance(ProductInstance),
    Quantity(Quantity),
    Scalar(f64),
}

impl From<ProductInstance> for InstanceOperand {
    fn from(instance: ProductInstance) -> Self {
        Self::Instance(instance)
    }
}

impl From<&ProductInstance> for InstanceOperand {
    fn from(instance: &ProductInstance) -> Self {
        Self::Instance(instance.clone())
    }
}

impl From<Quantity> for InstanceOperand {
    fn from(quantity: Quantity) -> Self {
        Self::Quantity(quantity)
    }
}

impl From<&Quantity> for InstanceOperand {
    fn from(quantity: &Quantity) -> Self {
        Self::Quantity(quantity.clone())
    }
}

impl From<f64> for InstanceOperand {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<i32> for InstanceOperand {
    fn from(value: i32) -> Self {
        Self::Scalar(f64::from(value))
    }
}

impl From<Operand> for InstanceOperand {
    fn from(operand: Operand) -> Self {
        match operand {
            Operand::Quantity(quantity) => Self::Quantity(quantity),
            Operand::Scalar(value) => Self::Scalar(value),
        }
    }
}

impl ProductInstance {
    pub fn new(product: ProductRef, quantity: Quantity) -> Self {
        Self { product, quantity }
    }

    /// Zero of `product`, expressed in the unit of its reference quantity.
    pub fn zero(product: ProductRef) -> Self {
        let unit = product.reference_quantity.unit.clone();
        Self::new(product, Quantity::zero(unit))
    }

    /// The product's BoM with every entry multiplied by this instance's
    /// quantity. `None` for raw materials.
    pub fn bom(&self) -> LciResult<Option<Bom>> {
        self.product
            .bom()
            .map(|bom| bom.multiply(&self.quantity))
            .transpose()
    }

    /// Converts the operand into a quantity operand, rejecting instances of
    /// another product.
    fn quantity_operand(&self, other: InstanceOperand) -> LciResult<Operand> {
        match other {
            InstanceOperand::Instance(instance) => {
                if instance.product.id() != self.product.id() {
                    return Err(LciError::product_mismatch(&self.product.name, &instance.product.name));
                }
                Ok(Operand::Quantity(instance.quantity))
            }
            InstanceOperand::Quantity(quantity) => Ok(Operand::Quantity(quantity)),
            InstanceOperand::Scalar(value) => Ok(Operand::Scalar(value)),
        }
    }

    fn with_quantity(&self, quantity: Quantity) -> ProductInstance {
        ProductInstance::new(self.product.clone(), quantity)
    }

    pub fn add(&self, other: impl Into<InstanceOperand>) -> LciResult<ProductInstance> {
        let operand = self.quantity_operand(other.into())?;
        Ok(self.with_quantity(self.quantity.add(operand)?))
    }

    pub fn subtract(&self, other: impl Into<InstanceOperand>) -> LciResult<ProductInstance> {
        let operand = self.quantity_operand(other.into())?;
        Ok(self.with_quantity(self.quantity.subtract(operand)?))
    }

    pub fn multiply(&self, other: impl Into<InstanceOperand>) -> LciResult<ProductInstance> {
        let operand = self.quantity_operand(other.into())?;
        Ok(self.with_quantity(self.quantity.multiply(operand)?))
    }

    pub fn is_greater_than(&self, other: impl Into<InstanceOperand>) -> LciResult<bool> {
        let operand = self.quantity_operand(other.into())?;
        self.quantity.is_greater_than(operand)
    }

    /// Addition with a zero operand as neutral element.
    pub fn identity_add(&self, other: impl Into<InstanceOperand>) -> LciResult<ProductInstance> {
        let operand = self.quantity_operand(other.into())?;
        Ok(self.with_quantity(self.quantity.identity_add(operand)?))
    }
}

impl PartialEq for ProductInstance {
    fn eq(&self, other: &Self) -> bool {
        self.product.id() == other.product.id() && self.quantity == other.quantity
    }
}

impl fmt::Display for ProductInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.quantity, self.product.name)
    }
}
